mod symbol;
mod financial_record;

pub use symbol::Symbol;
pub use financial_record::{FinancialRecord, FinancialRecordView, NewFinancialRecord};
