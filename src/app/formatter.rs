use crate::app::codec;
use crate::app::models::{FileRecord, Timestamps, BLOCK_MARKER};
use chrono::{DateTime, Local};
use std::time::SystemTime;

pub struct OutputGenerator;

impl OutputGenerator {
    /// Re-emits the front matter as written so comments and ordering survive.
    pub fn front_matter(header: &str) -> String {
        format!("---{}\n---\n\n", header)
    }

    /// Classifies, encodes and wraps one record in a tagged block.
    pub fn block(record: FileRecord) -> String {
        let content = codec::classify(record.content);
        let encoding = content.encoding();
        let body = codec::encode(&content);

        let mut out = String::with_capacity(body.len() + record.path.len() * 2 + 128);
        out.push('\n');
        out.push_str(&format!("# {} \n", record.path));
        match record.timestamps {
            Timestamps::Local { created, modified } => {
                out.push_str(&format!("- Created :{} \n", format_time(created)));
                out.push_str(&format!("- Modified:{} \n", format_time(modified)));
            }
            Timestamps::Fetched(at) => {
                out.push_str(&format!("- Fetched :{} \n", format_time(Some(at))));
            }
        }
        out.push_str(&format!(
            "\n```{}{}:{}\n",
            BLOCK_MARKER, record.path, encoding
        ));
        out.push_str(&body);
        out.push_str("\n```");
        out
    }

    pub fn document(header: &str, blocks: &[String]) -> String {
        let mut out = Self::front_matter(header);
        for block in blocks {
            out.push_str(block);
        }
        out
    }
}

fn format_time(time: Option<SystemTime>) -> String {
    match time {
        Some(t) => DateTime::<Local>::from(t)
            .format("%Y/%m/%d %H:%M:%S")
            .to_string(),
        None => "unknown".to_string(),
    }
}
