use anyhow::Result;
use clap::{Args, ValueEnum};

use crate::models::{SchemaKind, json_schema};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SchemaTarget {
    Request,
    DataQualityRequest,
    Summary,
    Detail,
    DataQuality,
}

impl SchemaTarget {
    fn kind(self) -> SchemaKind {
        match self {
            Self::Request => SchemaKind::ReportRequest,
            Self::DataQualityRequest => SchemaKind::DataQualityRequest,
            Self::Summary => SchemaKind::Summary,
            Self::Detail => SchemaKind::Detail,
            Self::DataQuality => SchemaKind::DataQuality,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct SchemaArgs {
    #[arg(long, value_enum)]
    pub kind: SchemaTarget,
}

pub fn run(args: &SchemaArgs) -> Result<()> {
    super::print_json(&json_schema(args.kind.kind()))?;
    Ok(())
}
