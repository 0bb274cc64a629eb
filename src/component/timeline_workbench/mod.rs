//! 互動式時間軸工作台
//!
//! 掃描資料夾或匯入 CSV 後，依間隔門檻合併並顯示各軌道的連續片段。

mod main;
mod session;

pub use main::TimelineWorkbench;
pub use session::{TimelineSession, TrackSummary};
