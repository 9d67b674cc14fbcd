//! Shared functionality which is used in unit-tests across the crate.


pub(crate) use builders::DetailRecordBuilder;
