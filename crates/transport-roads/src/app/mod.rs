//! Command-line application: seed, optionally apply updates, run one command

mod settings;
mod views;

pub use settings::{Command, NearArgs, RectArgs, Settings};
pub use views::{LineString, RoadView, SegmentView};

use serde::Serialize;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;
use transport_roads_lib::messaging::UpdateRoadSegmentSurface;
use transport_roads_lib::{Config, DataError, Datastore, SharedDatastore};

/// Error types for the application
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Seed a datastore from the segments file, if one is configured and can be opened
///
/// A file that cannot be opened leaves the datastore empty. A file that fails while
/// being read is an error.
pub fn load_datastore(settings: &Settings) -> Result<Datastore, AppError> {
    let mut datastore = Datastore::new(Config::default());

    let Some(path) = settings.segsfile.as_deref() else {
        tracing::info!("No segments file given. Datastore will not be seeded.");
        return Ok(datastore);
    };

    match File::open(path) {
        Ok(file) => {
            datastore.seed(BufReader::new(file))?;
        }
        Err(err) => {
            tracing::info!(
                "Failed to open the segments file {}: {err}. Datastore will not be seeded.",
                path.display()
            );
        }
    }

    Ok(datastore)
}

/// Run the configured command, writing its results to `out` as JSON lines
pub fn run(settings: &Settings, out: &mut impl Write) -> Result<(), AppError> {
    let datastore = SharedDatastore::new(load_datastore(settings)?);

    if let Some(path) = settings.updates.as_deref() {
        let mut sink = io::sink();
        apply_updates(&datastore, open_input(path)?, &mut sink)?;
    }

    let page = settings.pagination();

    match &settings.command {
        Command::RoadsNear(args) => datastore.read(|ds| {
            ds.query_roads(&args.filter(), page, |road| {
                emit(out, &RoadView::from(road))
            })
        })??,
        Command::RoadsWithin(args) => datastore.read(|ds| {
            ds.query_roads(&args.filter(), page, |road| {
                emit(out, &RoadView::from(road))
            })
        })??,
        Command::SegmentsNear(args) => datastore.read(|ds| {
            ds.query_segments(&args.filter(), page, |segment| {
                emit(out, &SegmentView::from(segment))
            })
        })??,
        Command::SegmentsWithin(args) => datastore.read(|ds| {
            ds.query_segments(&args.filter(), page, |segment| {
                emit(out, &SegmentView::from(segment))
            })
        })??,
        Command::Segment { id } => datastore.read(|ds| -> Result<(), AppError> {
            let segment = ds.get_road_segment_by_id(id)?;
            emit(out, &SegmentView::from(segment))
        })??,
        Command::Road { id } => datastore.read(|ds| -> Result<(), AppError> {
            let road = ds.get_road_by_id(id)?;
            emit(out, &RoadView::from(road))
        })??,
        Command::ApplyUpdates { file } => {
            apply_updates(&datastore, open_input(file)?, out)?;
        }
        Command::Info => {
            let info = datastore.read(|ds| ds.get_info())?;
            emit(out, &info)?;
        }
    }

    out.flush()?;
    Ok(())
}

/// Apply every surface update command read from `input`, writing the events produced
///
/// Lines that do not parse or are rejected are logged and skipped. Returns the number
/// of applied updates.
pub fn apply_updates(
    datastore: &SharedDatastore,
    input: impl BufRead,
    out: &mut impl Write,
) -> Result<usize, AppError> {
    let mut applied = 0usize;

    for (index, line) in input.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let command: UpdateRoadSegmentSurface = match serde_json::from_str(&line) {
            Ok(command) => command,
            Err(err) => {
                tracing::warn!("Ignoring malformed update on line {}: {err}", index + 1);
                continue;
            }
        };

        match datastore.write(|ds| command.apply(ds))? {
            Ok(event) => {
                tracing::debug!("Publishing {} on {}", event.content_type(), event.topic_name());
                emit(out, &event)?;
                applied += 1;
            }
            Err(err) => tracing::warn!("Rejected update for segment {}: {err}", command.id),
        }
    }

    tracing::info!("Applied {applied} surface updates.");
    Ok(applied)
}

fn open_input(path: &Path) -> Result<Box<dyn BufRead>, AppError> {
    if path == Path::new("-") {
        return Ok(Box::new(io::stdin().lock()));
    }
    Ok(Box::new(BufReader::new(File::open(path)?)))
}

fn emit(out: &mut impl Write, value: &impl Serialize) -> Result<(), AppError> {
    serde_json::to_writer(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}
