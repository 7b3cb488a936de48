pub mod solvedac;
