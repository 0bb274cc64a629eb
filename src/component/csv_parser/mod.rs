//! CSV 時間軸匯入元件
//!
//! 依欄位標題判斷角色，寬鬆解析時間並重建時間軸事件。

mod column_role;
mod datetime_parser;
mod parser;

pub use column_role::{ColumnMap, ColumnRole};
pub use datetime_parser::{DateTimeSource, ParsedDateTime, parse_datetime};
pub use parser::{CsvParser, ParseOutcome};
