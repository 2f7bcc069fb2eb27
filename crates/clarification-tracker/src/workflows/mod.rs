pub mod clarifications;
