use log::trace;
use std::cmp::Ordering;

use super::types::{total_pages, FilterSpec, PageSpec, SortDirection, SortSpec};
use crate::records::Record;

/// One page of a filtered, sorted view. Rows borrow from the source table.
#[derive(Debug, PartialEq)]
pub struct QueryPage<'a, R> {
    pub rows: Vec<&'a R>,
    /// Matches before pagination.
    pub total_matches: usize,
    pub page: usize,
    pub total_pages: usize,
}

impl<'a, R> QueryPage<'a, R> {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Filters, sorts and paginates `records`.
///
/// Pure: the result depends only on the arguments, so calling it again with
/// the same inputs yields the same page. Ties under `sort` keep their input
/// order in both directions. A page beyond the last one is empty.
pub fn apply<'a, R, I>(
    records: I,
    filter: &FilterSpec,
    sort: Option<&SortSpec>,
    page: PageSpec,
) -> QueryPage<'a, R>
where
    R: Record + 'a,
    I: IntoIterator<Item = &'a R>,
{
    let needle = filter.search_term().map(str::to_lowercase);

    let mut rows: Vec<&R> = records
        .into_iter()
        .filter(|record| matches_equals(*record, filter))
        .filter(|record| match needle.as_deref() {
            Some(needle) => matches_search(*record, needle),
            None => true,
        })
        .collect();

    if let Some(sort) = sort {
        // slice::sort_by is stable; reversing the comparator rather than the
        // output keeps tied rows in input order for descending sorts too.
        rows.sort_by(|a, b| {
            let ordering = compare_by(*a, *b, &sort.key);
            match sort.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
    }

    let total_matches = rows.len();
    let start = page.offset().min(total_matches);
    let end = start.saturating_add(page.size()).min(total_matches);
    let rows: Vec<&R> = rows.drain(start..end).collect();

    trace!(
        "query matched {} row(s), returning {} on page {}",
        total_matches,
        rows.len(),
        page.page()
    );

    QueryPage {
        rows,
        total_matches,
        page: page.page(),
        total_pages: total_pages(total_matches, page.size()),
    }
}

/// Every active equality predicate must match exactly. A predicate on a field
/// the record does not have never matches.
fn matches_equals<R: Record>(record: &R, filter: &FilterSpec) -> bool {
    filter.active_equals().all(|(field, expected)| {
        record
            .field(field)
            .as_text()
            .is_some_and(|actual| actual == expected)
    })
}

fn matches_search<R: Record>(record: &R, needle: &str) -> bool {
    R::SEARCH_FIELDS.iter().any(|field| {
        record
            .field(field)
            .as_text()
            .is_some_and(|text| text.to_lowercase().contains(needle))
    })
}

/// Three-way comparison of two records on a field, as used by [`apply`].
pub fn compare_by<R: Record>(a: &R, b: &R, key: &str) -> Ordering {
    a.field(key).cmp(&b.field(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{ConnectionRecord, PacketRecord, RecordId};

    fn packet(id: i64, protocol: &str, src_ip: &str, bytes: u64) -> PacketRecord {
        let mut packet: PacketRecord =
            serde_json::from_str(r#"{"timestamp":"2024-03-01T10:15:00Z"}"#).unwrap();
        packet.id = RecordId::Numeric(id);
        packet.protocol = protocol.to_string();
        packet.src_ip = src_ip.to_string();
        packet.payload_size = bytes;
        packet
    }

    fn ids<R: Record>(page: &QueryPage<'_, R>) -> Vec<RecordId> {
        page.rows.iter().map(|r| r.id().clone()).collect()
    }

    #[test]
    fn descending_sort_keeps_ties_in_input_order() {
        let records = vec![
            packet(1, "TCP", "10.0.0.1", 100),
            packet(2, "TCP", "10.0.0.2", 500),
            packet(3, "TCP", "10.0.0.3", 100),
        ];

        let page = apply(
            &records,
            &FilterSpec::new(),
            Some(&SortSpec::desc("bytes")),
            PageSpec::new(1, 20),
        );

        assert_eq!(
            ids(&page),
            vec![RecordId::from(2), RecordId::from(1), RecordId::from(3)]
        );
    }

    #[test]
    fn ascending_sort_keeps_ties_in_input_order() {
        let records = vec![
            packet(1, "TCP", "10.0.0.1", 100),
            packet(2, "TCP", "10.0.0.2", 500),
            packet(3, "TCP", "10.0.0.3", 100),
        ];

        let page = apply(
            &records,
            &FilterSpec::new(),
            Some(&SortSpec::asc("bytes")),
            PageSpec::new(1, 20),
        );

        assert_eq!(
            ids(&page),
            vec![RecordId::from(1), RecordId::from(3), RecordId::from(2)]
        );
    }

    #[test]
    fn empty_filter_returns_everything() {
        let records: Vec<_> = (0..5).map(|i| packet(i, "UDP", "10.0.0.9", 10)).collect();
        let page = apply(&records, &FilterSpec::new(), None, PageSpec::new(1, 20));
        assert_eq!(page.total_matches, 5);
        assert_eq!(page.rows.len(), 5);
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn apply_is_idempotent() {
        let records = vec![
            packet(1, "TCP", "192.168.1.4", 300),
            packet(2, "UDP", "192.168.1.5", 200),
            packet(3, "TCP", "10.1.1.1", 100),
        ];
        let filter = FilterSpec::new().with_search("192.168");
        let sort = SortSpec::asc("bytes");

        let first = apply(&records, &filter, Some(&sort), PageSpec::new(1, 2));
        let second = apply(&records, &filter, Some(&sort), PageSpec::new(1, 2));
        assert_eq!(first, second);
    }

    #[test]
    fn equality_and_search_are_combined() {
        let records = vec![
            packet(1, "TCP", "192.168.1.4", 300),
            packet(2, "UDP", "192.168.1.5", 200),
            packet(3, "TCP", "10.1.1.1", 100),
        ];
        let filter = FilterSpec::new()
            .with_equals("protocol", "TCP")
            .with_search("192.168");

        let page = apply(&records, &filter, None, PageSpec::new(1, 20));
        assert_eq!(ids(&page), vec![RecordId::from(1)]);
    }

    #[test]
    fn search_is_case_insensitive_and_covers_ports() {
        let conn: ConnectionRecord = serde_json::from_str(
            r#"{"id":"c1","source_ip":"10.0.0.1","source_port":22,"dest_ip":"10.0.0.2",
                "dest_port":8443,"protocol":"TCP","application":"OpenSSH","status":"active",
                "start_time":"2024-03-01T10:00:00Z"}"#,
        )
        .unwrap();
        let records = vec![conn];

        let by_app = apply(&records, &FilterSpec::new().with_search("openssh"), None, PageSpec::new(1, 5));
        let by_port = apply(&records, &FilterSpec::new().with_search("844"), None, PageSpec::new(1, 5));
        let miss = apply(&records, &FilterSpec::new().with_search("udp"), None, PageSpec::new(1, 5));

        assert_eq!(by_app.total_matches, 1);
        assert_eq!(by_port.total_matches, 1);
        assert_eq!(miss.total_matches, 0);
    }

    #[test]
    fn unknown_equality_field_matches_nothing() {
        let records = vec![packet(1, "TCP", "10.0.0.1", 1)];
        let filter = FilterSpec::new().with_equals("no_such_field", "x");
        assert!(apply(&records, &filter, None, PageSpec::new(1, 5)).is_empty());
    }

    #[test]
    fn pagination_slices_and_clamps() {
        let records: Vec<_> = (1..=7).map(|i| packet(i, "TCP", "10.0.0.1", 1)).collect();

        let second = apply(&records, &FilterSpec::new(), None, PageSpec::new(2, 3));
        assert_eq!(
            ids(&second),
            vec![RecordId::from(4), RecordId::from(5), RecordId::from(6)]
        );
        assert_eq!(second.total_pages, 3);

        let last = apply(&records, &FilterSpec::new(), None, PageSpec::new(3, 3));
        assert_eq!(ids(&last), vec![RecordId::from(7)]);

        let beyond = apply(&records, &FilterSpec::new(), None, PageSpec::new(9, 3));
        assert!(beyond.is_empty());
        assert_eq!(beyond.total_matches, 7);
    }

    #[test]
    fn compare_by_orders_on_field() {
        let a = packet(1, "TCP", "10.0.0.1", 100);
        let b = packet(2, "TCP", "10.0.0.1", 200);
        assert_eq!(compare_by(&a, &b, "bytes"), Ordering::Less);
    }
}
