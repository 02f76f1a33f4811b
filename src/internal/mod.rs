//! Internal implementation details.

pub(crate) mod build_table;
pub(crate) mod circular;
pub(crate) mod dispose_bag;

pub(crate) use build_table::BuildTable;
pub(crate) use circular::with_circular_check;
pub(crate) use dispose_bag::DisposeBag;
