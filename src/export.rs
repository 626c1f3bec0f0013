//! CSV export of support messages.
//!
//! Output opens cleanly in spreadsheet tools: UTF-8 with a byte order mark,
//! `\n` line endings, every non-numeric field quoted.

use csv::{QuoteStyle, Terminator, WriterBuilder};
use family_tree_types::SupportMessage;

pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";
pub const CSV_DISPOSITION: &str = "attachment; filename=\"support_messages.csv\"";

const BOM: &str = "\u{FEFF}";
const HEADER: [&str; 5] = ["id", "sender_name", "phone", "message", "created_at"];

pub fn support_messages_csv(messages: &[SupportMessage]) -> Result<Vec<u8>, csv::Error> {
    // Header goes out bare; rows quote everything that is not a number.
    let mut header = WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .from_writer(BOM.as_bytes().to_vec());
    header.write_record(HEADER)?;
    let buf = header.into_inner().map_err(|e| e.into_error())?;

    let mut rows = WriterBuilder::new()
        .quote_style(QuoteStyle::NonNumeric)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(buf);
    for m in messages {
        let id = m.id.to_string();
        rows.write_record([
            id.as_str(),
            m.sender_name.as_deref().unwrap_or(""),
            m.phone.as_deref().unwrap_or(""),
            m.message.as_deref().unwrap_or(""),
            m.created_at.as_deref().unwrap_or(""),
        ])?;
    }
    rows.into_inner().map_err(|e| e.into_error().into())
}
