//! Extraction of panorama records from the provider's discovery responses.
//!
//! The discovery endpoints return a JavaScript callback invocation wrapping a
//! deeply nested, undocumented array literal. Rather than model the whole
//! structure, this module pattern-matches the two stable fragment shapes and
//! ignores everything else:
//!
//! - record fragment (rich): `[2,"<id>"]` ... `[[null,null,<lat>,<lon>],
//!   [<altitude>],[<heading>,<tilt>,<roll>]`
//! - record fragment (loose): `[<n>,"<id>"]` ... `[[null,null,<lat>,<lon>]`
//! - date fragment: an optional numeric index, then `[<year 20xx>,<month>]`
//!
//! Records appear newest-first; dates appear in the same order as the records
//! except that the newest date is last. [`reconcile_dates`] encodes that
//! mapping explicitly.
//!
//! `GRAMMAR_VERSION` is bumped whenever a pattern changes so provider format
//! drift shows up in fixtures instead of silently corrupting data.

use crate::types::{CaptureDate, PanoramaRecord};
use regex::Regex;

/// Version of the response grammar the patterns below were written against.
pub const GRAMMAR_VERSION: u32 = 1;

const RICH_RECORD_PATTERN: &str = r#"\[2,"(.+?)"\].+?\[\[null,null,(-?[0-9]+\.[0-9]+),(-?[0-9]+\.[0-9]+)\],\[-?[0-9]+\.[0-9]+\],\[(-?[0-9]+\.[0-9]+),(-?[0-9]+\.[0-9]+),(-?[0-9]+\.[0-9]+)"#;

const LOOSE_RECORD_PATTERN: &str =
    r#"\[[0-9]+,"(.+?)"\].+?\[\[null,null,(-?[0-9]+\.[0-9]+),(-?[0-9]+\.[0-9]+)"#;

const DATE_PATTERN: &str = r"(?:[0-9]{1,3})?,?\[(20[0-9]{2}),([0-9]+)\]";

/// Extract records with orientation data, in document order.
pub fn extract_records(text: &str) -> Vec<PanoramaRecord> {
    let re = Regex::new(RICH_RECORD_PATTERN).unwrap();
    re.captures_iter(text)
        .filter_map(|cap| {
            Some(PanoramaRecord {
                pano_id: cap.get(1)?.as_str().to_string(),
                lat: cap.get(2)?.as_str().parse().ok()?,
                lon: cap.get(3)?.as_str().parse().ok()?,
                heading: Some(cap.get(4)?.as_str().parse().ok()?),
                tilt: Some(cap.get(5)?.as_str().parse().ok()?),
                roll: Some(cap.get(6)?.as_str().parse().ok()?),
                date: None,
            })
        })
        .collect()
}

/// Extract id/lat/lon-only records, in document order.
///
/// Used for responses obtained out-of-band, where the richer fragment shape is
/// not guaranteed to be present.
pub fn extract_records_loose(text: &str) -> Vec<PanoramaRecord> {
    let re = Regex::new(LOOSE_RECORD_PATTERN).unwrap();
    re.captures_iter(text)
        .filter_map(|cap| {
            Some(PanoramaRecord {
                pano_id: cap.get(1)?.as_str().to_string(),
                lat: cap.get(2)?.as_str().parse().ok()?,
                lon: cap.get(3)?.as_str().parse().ok()?,
                heading: None,
                tilt: None,
                roll: None,
                date: None,
            })
        })
        .collect()
}

/// Extract capture dates, in document order.
///
/// The leading index token is discarded; fragments whose month falls outside
/// 1..=12 (or does not fit a month at all) are silently dropped.
pub fn extract_dates(text: &str) -> Vec<CaptureDate> {
    let re = Regex::new(DATE_PATTERN).unwrap();
    re.captures_iter(text)
        .filter_map(|cap| {
            let year = cap.get(1)?.as_str().parse().ok()?;
            let month: u8 = cap.get(2)?.as_str().parse().ok()?;
            Some(CaptureDate { year, month })
        })
        .filter(|d| (1..=12).contains(&d.month))
        .collect()
}

/// Remove duplicate records, keeping the first occurrence order.
pub fn dedupe(records: Vec<PanoramaRecord>) -> Vec<PanoramaRecord> {
    let mut out: Vec<PanoramaRecord> = Vec::with_capacity(records.len());
    for record in records {
        if !out.contains(&record) {
            out.push(record);
        }
    }
    out
}

/// Bind capture dates to records.
///
/// The provider lists records newest-first but dates oldest-first with the
/// newest date at the very end. So: the last date belongs to the first record,
/// and the remaining dates apply in reverse to the records counting backward
/// from the end of the list. The first record is never overwritten by that
/// backward pass, and surplus dates are dropped. Records beyond the available
/// date count stay undated.
pub fn reconcile_dates(records: &mut [PanoramaRecord], dates: &[CaptureDate]) {
    let Some((&newest, older)) = dates.split_last() else {
        return;
    };
    let Some((first, rest)) = records.split_first_mut() else {
        return;
    };
    first.date = Some(newest);
    for (record, &date) in rest.iter_mut().rev().zip(older.iter().rev()) {
        record.date = Some(date);
    }
}

/// Stable sort: ascending by capture date, undated records after all dated
/// ones, original order preserved among equal keys.
pub fn sort_by_capture_date(records: &mut [PanoramaRecord]) {
    records.sort_by_key(|r| (r.date.is_none(), r.date));
}

fn finish(records: Vec<PanoramaRecord>, dates: Vec<CaptureDate>, closest: bool) -> Vec<PanoramaRecord> {
    let mut records = dedupe(records);
    reconcile_dates(&mut records, &dates);
    sort_by_capture_date(&mut records);
    if closest {
        // Provider convention: dated entries represent genuinely distinct
        // visits, so "closest" keeps one leading record per parsed date.
        records.truncate(dates.len());
    }
    records
}

/// Full parse of a discovery response body using the rich record shape.
pub fn parse_discovery_response(text: &str, closest: bool) -> Vec<PanoramaRecord> {
    finish(extract_records(text), extract_dates(text), closest)
}

/// Full parse using the loose record shape, identical dedupe/date/sort logic.
pub fn parse_discovery_response_loose(text: &str, closest: bool) -> Vec<PanoramaRecord> {
    finish(extract_records_loose(text), extract_dates(text), closest)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_fragment(id: &str, lat: f64, lon: f64) -> String {
        format!(
            "[2,\"{id}\"],[[5,6]],[[null,null,{lat:.7},{lon:.7}],[170.35],[147.27,89.96,1.05]]"
        )
    }

    fn date_fragment(year: u16, month: u8) -> String {
        format!("7,[{year},{month}]")
    }

    #[test]
    fn test_rich_extraction_fields() {
        let body = record_fragment("CAoSLEF", 48.8583701, 2.2944813);
        let records = extract_records(&body);
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.pano_id, "CAoSLEF");
        assert!((r.lat - 48.8583701).abs() < 1e-6);
        assert!((r.lon - 2.2944813).abs() < 1e-6);
        assert_eq!(r.heading, Some(147.27));
        assert_eq!(r.tilt, Some(89.96));
        assert_eq!(r.roll, Some(1.05));
        assert_eq!(r.date, None);
    }

    #[test]
    fn test_loose_extraction_has_no_orientation() {
        let body = "[3,\"abc\"],[[null,null,41.8982208,12.4764804]";
        let records = extract_records_loose(body);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].pano_id, "abc");
        assert_eq!(records[0].heading, None);
        assert_eq!(records[0].tilt, None);
        assert_eq!(records[0].roll, None);
    }

    #[test]
    fn test_empty_body_yields_no_records() {
        assert!(parse_discovery_response("", false).is_empty());
        assert!(parse_discovery_response("Search returned no images.", false).is_empty());
    }

    #[test]
    fn test_duplicate_fragments_collapse_to_one() {
        let frag = record_fragment("dup", 1.5, 2.5);
        let body = format!("{frag},{frag},{frag}");
        let records = parse_discovery_response(&body, false);
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_month_range_filter() {
        let body = format!(
            "{},{},{}",
            date_fragment(2015, 0),
            date_fragment(2016, 13),
            date_fragment(2017, 12)
        );
        let dates = extract_dates(&body);
        assert_eq!(dates, vec![CaptureDate { year: 2017, month: 12 }]);
    }

    #[test]
    fn test_date_index_token_discarded() {
        let dates = extract_dates("[2014,7]");
        assert_eq!(dates, extract_dates("123,[2014,7]"));
        assert_eq!(dates.len(), 1);
    }

    fn bare_record(id: &str) -> PanoramaRecord {
        PanoramaRecord {
            pano_id: id.to_string(),
            lat: 0.0,
            lon: 0.0,
            heading: None,
            tilt: None,
            roll: None,
            date: None,
        }
    }

    #[test]
    fn test_reconcile_zero_dates() {
        let mut records = vec![bare_record("a"), bare_record("b")];
        reconcile_dates(&mut records, &[]);
        assert!(records.iter().all(|r| r.date.is_none()));
    }

    #[test]
    fn test_reconcile_fewer_dates_than_records() {
        // First record takes the last (newest) date; the older dates fill in
        // backward from the end; the middle stays undated.
        let mut records = vec![
            bare_record("newest"),
            bare_record("unknown"),
            bare_record("mid"),
            bare_record("oldest"),
        ];
        let dates = vec![
            CaptureDate { year: 2012, month: 3 },
            CaptureDate { year: 2013, month: 8 },
            CaptureDate { year: 2016, month: 1 },
        ];
        reconcile_dates(&mut records, &dates);
        assert_eq!(records[0].date, Some(CaptureDate { year: 2016, month: 1 }));
        assert_eq!(records[1].date, None);
        assert_eq!(records[2].date, Some(CaptureDate { year: 2012, month: 3 }));
        assert_eq!(records[3].date, Some(CaptureDate { year: 2013, month: 8 }));
    }

    #[test]
    fn test_reconcile_dates_equal_to_records() {
        let mut records = vec![bare_record("a"), bare_record("b"), bare_record("c")];
        let dates = vec![
            CaptureDate { year: 2011, month: 5 },
            CaptureDate { year: 2012, month: 6 },
            CaptureDate { year: 2015, month: 9 },
        ];
        reconcile_dates(&mut records, &dates);
        assert_eq!(records[0].date, Some(CaptureDate { year: 2015, month: 9 }));
        assert_eq!(records[1].date, Some(CaptureDate { year: 2011, month: 5 }));
        assert_eq!(records[2].date, Some(CaptureDate { year: 2012, month: 6 }));
    }

    #[test]
    fn test_reconcile_more_dates_than_records() {
        // Surplus oldest dates are dropped; the first record keeps the newest
        // date and is never overwritten by the backward pass.
        let mut records = vec![bare_record("a"), bare_record("b")];
        let dates = vec![
            CaptureDate { year: 2010, month: 1 },
            CaptureDate { year: 2011, month: 2 },
            CaptureDate { year: 2012, month: 3 },
            CaptureDate { year: 2015, month: 4 },
        ];
        reconcile_dates(&mut records, &dates);
        assert_eq!(records[0].date, Some(CaptureDate { year: 2015, month: 4 }));
        assert_eq!(records[1].date, Some(CaptureDate { year: 2012, month: 3 }));
    }

    #[test]
    fn test_sort_undated_after_dated_stable() {
        let mut records = vec![bare_record("u1"), bare_record("d1"), bare_record("u2"), bare_record("d2")];
        records[1].date = Some(CaptureDate { year: 2014, month: 2 });
        records[3].date = Some(CaptureDate { year: 2012, month: 7 });
        sort_by_capture_date(&mut records);
        let ids: Vec<&str> = records.iter().map(|r| r.pano_id.as_str()).collect();
        assert_eq!(ids, vec!["d2", "d1", "u1", "u2"]);
    }

    #[test]
    fn test_two_records_one_date() {
        // The single date binds to the first (newest) record; the other record
        // stays undated and sorts after it.
        let body = format!(
            "{},{},{}",
            record_fragment("new", 48.0000001, 2.0000001),
            record_fragment("old", 48.0000002, 2.0000002),
            date_fragment(2019, 6)
        );
        let records = parse_discovery_response(&body, false);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].pano_id, "new");
        assert_eq!(records[0].date, Some(CaptureDate { year: 2019, month: 6 }));
        assert_eq!(records[1].pano_id, "old");
        assert_eq!(records[1].date, None);
    }

    #[test]
    fn test_closest_truncates_to_date_count() {
        let body = format!(
            "{},{},{}",
            record_fragment("new", 48.0000001, 2.0000001),
            record_fragment("old", 48.0000002, 2.0000002),
            date_fragment(2019, 6)
        );
        let records = parse_discovery_response(&body, true);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].pano_id, "new");
    }

    #[test]
    fn test_full_document_order_and_sort() {
        // Three records, three dates: after reconciliation the list sorts
        // ascending by capture date.
        let body = format!(
            "{},{},{},{},{},{}",
            record_fragment("r2019", 1.0000001, 1.0000001),
            record_fragment("r2013", 1.0000002, 1.0000002),
            record_fragment("r2015", 1.0000003, 1.0000003),
            date_fragment(2013, 4),
            date_fragment(2015, 10),
            date_fragment(2019, 2)
        );
        let records = parse_discovery_response(&body, false);
        let ids: Vec<&str> = records.iter().map(|r| r.pano_id.as_str()).collect();
        assert_eq!(ids, vec!["r2013", "r2015", "r2019"]);
    }
}
