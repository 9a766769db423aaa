use crate::args::Commands;
use anyhow::{bail, Context};
use comm_tracker_core::{
    CommFieldsPatch, CommRecord, CommService, ReviewUpdate, SqliteCommRepository,
};
use log::info;
use rusqlite::Connection;

const TABLE_HEADER: [&str; 7] = [
    "ID",
    "Date",
    "Comm Name",
    "Comm Type",
    "Template ID",
    "Created By",
    "Checked By",
];

pub fn dispatch(conn: &mut Connection, command: Commands) -> anyhow::Result<()> {
    let repo = SqliteCommRepository::try_new(conn).context("database is not ready")?;
    let mut service = CommService::new(repo);

    match command {
        Commands::Add {
            name,
            comm_type,
            template,
        } => {
            let id = service.create_comm(&name, &comm_type, &template)?;
            info!("event=cli_add module=cli status=ok id={id}");
            println!("Added communication {id}");
        }
        Commands::List => print_table(&service.list_comms()?),
        Commands::Search { term } => print_table(&service.search_comms(term.trim())?),
        Commands::Show { id } => print_details(&service.get_comm(id)?),
        Commands::Edit {
            id,
            name,
            created_by,
            checked_by,
        } => {
            let current = service.get_comm(id)?;
            let patch = locked_patch(
                &current,
                CommFieldsPatch {
                    comm_name: name,
                    created_by,
                    checked_by,
                },
            )?;
            service.update_fields(id, &patch)?;
            println!("Updated communication {id}");
        }
        Commands::Review {
            id,
            name,
            created_by,
            checked_by,
            links_ok,
            format_ok,
            cta_ok,
            peer_reviewed,
        } => {
            let mut review = ReviewUpdate::from_record(&service.get_comm(id)?);
            if let Some(name) = name {
                review.comm_name = name;
            }
            if let Some(created_by) = created_by {
                review.created_by = created_by;
            }
            if let Some(checked_by) = checked_by {
                review.checked_by = checked_by;
            }
            review.links_qr_correct = links_ok.unwrap_or(review.links_qr_correct);
            review.format_correct = format_ok.unwrap_or(review.format_correct);
            review.cta_correct = cta_ok.unwrap_or(review.cta_correct);
            review.peer_reviewed = peer_reviewed.unwrap_or(review.peer_reviewed);
            service.update_review(id, &review)?;
            println!("Saved review for communication {id}");
        }
        Commands::Delete { ids } => {
            let removed = service.delete_comms(&ids)?;
            println!("Deleted {removed} of {} selected communications", ids.len());
        }
        Commands::Import { file } => {
            let imported = service.import_csv(&file)?;
            println!("Imported {imported} communications from {}", file.display());
        }
        Commands::Export { file } => {
            let exported = service.export_csv(&file)?;
            println!("Exported {exported} communications to {}", file.display());
        }
    }

    Ok(())
}

/// Drops edits to `created_by`/`checked_by` that would replace a value
/// already recorded. Once a person is named, the field is read-only here.
fn locked_patch(current: &CommRecord, patch: CommFieldsPatch) -> anyhow::Result<CommFieldsPatch> {
    for (field, existing, requested) in [
        ("created_by", &current.created_by, &patch.created_by),
        ("checked_by", &current.checked_by, &patch.checked_by),
    ] {
        if let Some(requested) = requested {
            if !existing.is_empty() && requested != existing {
                bail!("{field} is already set to `{existing}` and cannot be changed");
            }
        }
    }
    Ok(patch)
}

fn print_table(records: &[CommRecord]) {
    let rows: Vec<[String; 7]> = records
        .iter()
        .map(|record| {
            [
                record.id.to_string(),
                record.date.clone(),
                record.comm_name.clone(),
                record.comm_type.clone(),
                record.template_id.clone(),
                record.created_by.clone(),
                record.checked_by.clone(),
            ]
        })
        .collect();
    print!("{}", render_table(&rows));
}

fn render_table(rows: &[[String; 7]]) -> String {
    let mut widths = TABLE_HEADER.map(str::len);
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_line(&mut out, &TABLE_HEADER, &widths);
    for row in rows {
        push_line(&mut out, row, &widths);
    }
    out
}

fn push_line<S: AsRef<str>>(out: &mut String, cells: &[S], widths: &[usize]) {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{:<width$}", cell.as_ref()))
        .collect::<Vec<_>>()
        .join("  ");
    out.push_str(line.trim_end());
    out.push('\n');
}

fn print_details(record: &CommRecord) {
    println!("ID:               {}", record.id);
    println!("Date:             {}", record.date);
    println!("Comm Name:        {}", record.comm_name);
    println!("Comm Type:        {}", record.comm_type);
    println!("Template ID:      {}", record.template_id);
    println!("Created By:       {}", record.created_by);
    println!("Checked By:       {}", record.checked_by);
    println!("Links/QR Correct: {}", record.links_qr_correct);
    println!("Format Correct:   {}", record.format_correct);
    println!("CTA Correct:      {}", record.cta_correct);
    println!("Peer Reviewed:    {}", record.peer_reviewed);
}
