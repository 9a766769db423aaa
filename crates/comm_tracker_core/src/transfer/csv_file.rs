//! CSV reader/writer for communication records.
//!
//! Column order on export is the table order: `ID` first, then the ten data
//! columns. Import accepts either that shape (detected from an `ID` header)
//! or the ten data columns alone, of which only the first four are required.

use super::{TransferError, TransferResult};
use crate::model::comm::{today, Flag, NewComm};
use crate::repo::comm_repo::CommRepository;
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use log::{debug, info, warn};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Instant;

/// Header row written by [`export_file`].
pub const EXPORT_HEADER: [&str; 11] = [
    "ID",
    "Date",
    "Comm Name",
    "Comm Type",
    "Template ID",
    "Created By",
    "Checked By",
    "Links/QR Correct",
    "Format Correct",
    "CTA Correct",
    "Peer Reviewed",
];

const MIN_IMPORT_FIELDS: usize = 4;

/// Imports every usable row of `path` as a new record.
///
/// The first line is always treated as a header. Rows with fewer than four
/// data fields are skipped silently; rows with blank required fields or
/// unreadable flags are skipped with a warning. Returns the number of records
/// inserted.
pub fn import_file<R: CommRepository>(
    repo: &mut R,
    path: impl AsRef<Path>,
) -> TransferResult<usize> {
    let path = path.as_ref();
    let started_at = Instant::now();

    let file = File::open(path).map_err(|err| TransferError::import(path, err))?;
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(BufReader::new(file));

    let fallback_date = today();
    let mut leading_id_column = false;
    let mut comms = Vec::new();
    let mut skipped = 0usize;

    for (index, result) in reader.records().enumerate() {
        let record = result.map_err(|err| TransferError::import(path, err))?;
        if index == 0 {
            leading_id_column = has_id_header(&record);
            continue;
        }

        let fields = data_fields(&record, leading_id_column);
        if fields.len() < MIN_IMPORT_FIELDS {
            debug!(
                "event=comm_import_row module=transfer status=skipped record={} reason=too_few_fields",
                index + 1
            );
            skipped += 1;
            continue;
        }

        match comm_from_fields(&fields, &fallback_date) {
            Ok(comm) => comms.push(comm),
            Err(reason) => {
                warn!(
                    "event=comm_import_row module=transfer status=skipped record={} reason={reason}",
                    index + 1
                );
                skipped += 1;
            }
        }
    }

    let ids = repo
        .insert_batch(&comms)
        .map_err(|err| TransferError::import(path, err))?;

    info!(
        "event=comm_import module=transfer status=ok imported={} skipped={} duration_ms={}",
        ids.len(),
        skipped,
        started_at.elapsed().as_millis()
    );
    Ok(ids.len())
}

/// Writes the header and every stored record to `path`.
///
/// An existing file is truncated. On failure the partially written file is
/// left in place.
pub fn export_file<R: CommRepository>(repo: &R, path: impl AsRef<Path>) -> TransferResult<usize> {
    let path = path.as_ref();
    let started_at = Instant::now();

    let comms = repo
        .get_all()
        .map_err(|err| TransferError::export(path, err))?;

    let mut writer = WriterBuilder::new()
        .from_path(path)
        .map_err(|err| TransferError::export(path, err))?;
    writer
        .write_record(EXPORT_HEADER)
        .map_err(|err| TransferError::export(path, err))?;

    for comm in &comms {
        let id = comm.id.to_string();
        writer
            .write_record([
                id.as_str(),
                comm.date.as_str(),
                comm.comm_name.as_str(),
                comm.comm_type.as_str(),
                comm.template_id.as_str(),
                comm.created_by.as_str(),
                comm.checked_by.as_str(),
                comm.links_qr_correct.as_str(),
                comm.format_correct.as_str(),
                comm.cta_correct.as_str(),
                comm.peer_reviewed.as_str(),
            ])
            .map_err(|err| TransferError::export(path, err))?;
    }
    writer
        .flush()
        .map_err(|err| TransferError::export(path, err))?;

    info!(
        "event=comm_export module=transfer status=ok exported={} duration_ms={}",
        comms.len(),
        started_at.elapsed().as_millis()
    );
    Ok(comms.len())
}

fn has_id_header(header: &StringRecord) -> bool {
    header
        .get(0)
        .map(|first| first.trim_start_matches('\u{feff}').trim())
        .is_some_and(|first| first.eq_ignore_ascii_case("id"))
}

fn data_fields(record: &StringRecord, leading_id_column: bool) -> Vec<&str> {
    let skip = usize::from(leading_id_column);
    record.iter().skip(skip).collect()
}

/// Maps positional data fields onto an insert payload.
///
/// `fields` must hold at least the four required columns.
fn comm_from_fields(fields: &[&str], fallback_date: &str) -> Result<NewComm, String> {
    let text = |index: usize| fields.get(index).copied().unwrap_or_default();
    let flag = |index: usize| -> Result<Flag, String> {
        match fields.get(index).copied().map(str::trim) {
            None | Some("") => Ok(Flag::No),
            Some(value) => value
                .parse::<Flag>()
                .map_err(|_| format!("invalid_flag column={}", index + 1)),
        }
    };

    let date = match text(0) {
        "" => fallback_date.to_string(),
        value => value.to_string(),
    };

    let comm = NewComm {
        date,
        comm_name: text(1).to_string(),
        comm_type: text(2).to_string(),
        template_id: text(3).to_string(),
        created_by: text(4).to_string(),
        checked_by: text(5).to_string(),
        links_qr_correct: flag(6)?,
        format_correct: flag(7)?,
        cta_correct: flag(8)?,
        peer_reviewed: flag(9)?,
    };
    comm.validate()
        .map_err(|err| format!("validation_failed detail=\"{err}\""))?;
    Ok(comm)
}

#[cfg(test)]
mod tests {
    use super::{comm_from_fields, data_fields, has_id_header};
    use crate::model::comm::Flag;
    use csv::StringRecord;

    #[test]
    fn four_fields_take_defaults() {
        let comm =
            comm_from_fields(&["2024-02-02", "Promo", "SMS", "T-002"], "2030-01-01").unwrap();
        assert_eq!(comm.date, "2024-02-02");
        assert_eq!(comm.created_by, "");
        assert_eq!(comm.checked_by, "");
        assert_eq!(comm.links_qr_correct, Flag::No);
        assert_eq!(comm.format_correct, Flag::No);
        assert_eq!(comm.cta_correct, Flag::No);
        assert_eq!(comm.peer_reviewed, Flag::No);
    }

    #[test]
    fn empty_date_falls_back_to_today() {
        let comm = comm_from_fields(&["", "Promo", "SMS", "T-002"], "2030-01-01").unwrap();
        assert_eq!(comm.date, "2030-01-01");
    }

    #[test]
    fn full_row_maps_every_column() {
        let comm = comm_from_fields(
            &[
                "2024-03-03", "Launch", "Print", "T-9", "ana", "ben", "Yes", "no", "YES", "",
            ],
            "2030-01-01",
        )
        .unwrap();
        assert_eq!(comm.created_by, "ana");
        assert_eq!(comm.checked_by, "ben");
        assert_eq!(comm.links_qr_correct, Flag::Yes);
        assert_eq!(comm.format_correct, Flag::No);
        assert_eq!(comm.cta_correct, Flag::Yes);
        assert_eq!(comm.peer_reviewed, Flag::No);
    }

    #[test]
    fn rejects_unknown_flag_and_blank_required_field() {
        let bad_flag = comm_from_fields(
            &["2024-03-03", "Launch", "Print", "T-9", "", "", "maybe"],
            "2030-01-01",
        );
        assert!(bad_flag.unwrap_err().contains("invalid_flag"));

        let blank_type = comm_from_fields(&["2024-03-03", "Launch", "", "T-9"], "2030-01-01");
        assert!(blank_type.unwrap_err().contains("comm_type"));
    }

    #[test]
    fn id_header_drops_leading_column() {
        let header = StringRecord::from(vec!["\u{feff}ID", "Date", "Comm Name"]);
        assert!(has_id_header(&header));
        assert!(!has_id_header(&StringRecord::from(vec!["Date", "Comm Name"])));

        let row = StringRecord::from(vec!["7", "2024-01-01", "Spring Sale", "Email", "T-001"]);
        assert_eq!(
            data_fields(&row, true),
            vec!["2024-01-01", "Spring Sale", "Email", "T-001"]
        );
        assert_eq!(data_fields(&row, false).len(), 5);
    }
}
