mod change;
mod result_set;
mod row;

pub use change::ChangeResult;
pub use result_set::ResultSet;
pub use row::CustomDbRow;
