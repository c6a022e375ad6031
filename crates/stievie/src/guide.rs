//! Resolution of index-encoded program guides.
//!
//! `Program/GetOverview` interns every repeated string: program fields carry
//! string-encoded indices into parallel lookup tables shipped in the same
//! payload. This pass rewrites each program to its final form; nothing is
//! cached or returned until it has run.

use crate::error::StievieError;
use crate::models::{GuidePayload, Program, ProgramGuide, RawProgram};

pub(crate) fn resolve_guides(payload: GuidePayload) -> Result<Vec<ProgramGuide>, StievieError> {
    let GuidePayload {
        channels,
        series_ids,
        series_names,
        names,
        urls,
        tags,
    } = payload;

    channels
        .into_iter()
        .map(|guide| {
            let programs = guide
                .programs
                .into_iter()
                .map(|raw| resolve_program(raw, &series_ids, &series_names, &names, &urls, &tags))
                .collect::<Result<Vec<_>, _>>()?;

            Ok(ProgramGuide {
                channel_id: guide.channel_id,
                programs,
            })
        })
        .collect()
}

fn resolve_program(
    raw: RawProgram,
    series_ids: &[String],
    series_names: &[String],
    names: &[String],
    urls: &[String],
    tags: &[String],
) -> Result<Program, StievieError> {
    let name = lookup("Names", names, &raw.name)?;

    let series_id = if raw.series_id.is_empty() {
        None
    } else {
        Some(lookup("SeriesIDs", series_ids, &raw.series_id)?)
    };

    // The backend gates the series name on the series id, not on the series
    // name field itself; a resolved-but-empty id also suppresses it.
    let series_name = match &series_id {
        Some(id) if !id.is_empty() => Some(lookup("SeriesNames", series_names, &raw.series_name)?),
        _ => None,
    };

    let url = if raw.url.is_empty() {
        None
    } else {
        Some(lookup("Urls", urls, &raw.url)?)
    };

    let tag = if raw.tag.is_empty() {
        None
    } else {
        Some(lookup("Tags", tags, &raw.tag)?)
    };

    Ok(Program {
        id: raw.id,
        name,
        series_name,
        series_id,
        time: raw.time,
        description: raw.description,
        tag,
        url,
        video_links: raw.video_links,
        blackouts: raw.blackouts,
    })
}

fn lookup(
    table: &'static str,
    values: &[String],
    index: &str,
) -> Result<String, StievieError> {
    index
        .trim()
        .parse::<usize>()
        .ok()
        .and_then(|i| values.get(i))
        .cloned()
        .ok_or_else(|| StievieError::GuideIndex {
            table,
            value: index.to_owned(),
            len: values.len(),
        })
}
