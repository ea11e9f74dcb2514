pub mod bsm;
