pub mod data_quality;
pub mod mapathon;
pub mod output;

pub use data_quality::{geometry_to_point, get_data_quality_report};
pub use mapathon::{get_detailed_report, get_summary};
pub use output::{Output, OutputSource, QueryRunner};
