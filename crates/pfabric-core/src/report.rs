//! # Stats Reports
//!
//! Renders a [`SchedulerStats`] snapshot in three formats: a human-readable
//! report, a two-row CSV for scripts, and Prometheus text exposition.

use std::fmt::Write;

use crate::stats::SchedulerStats;

/// Human-readable report. `dropped` counts evictions; hard drops have
/// their own line.
pub fn render_text(stats: &SchedulerStats) -> String {
    let mut out = String::with_capacity(512 + stats.per_band_accepted.len() * 16);

    let _ = writeln!(out, "limit: {}", stats.limit);
    let _ = writeln!(out, "disable_dequeue: {}", u8::from(!stats.dequeue_enabled));
    let _ = writeln!(out, "dropped: {}", stats.evicted);
    let _ = writeln!(out, "packets: {}", stats.packets);
    let _ = writeln!(out, "bytes: {}", stats.bytes);
    let _ = writeln!(out, "backlog: {}", stats.backlog);
    let _ = writeln!(out, "non-priority-tagged packets: {}", stats.non_priority_tagged);
    let _ = writeln!(out, "illegal priority occurrences: {}", stats.illegal_priority);
    let _ = writeln!(out, "hard dropped: {}", stats.hard_dropped);

    let _ = writeln!(out, "bitmap:");
    for word in &stats.bitmap {
        let _ = writeln!(out, "{word:08x}");
    }

    let _ = writeln!(out, "Packet distribution across bands:");
    for (band, count) in stats.per_band_accepted.iter().enumerate() {
        let _ = writeln!(out, "Band {band}: {count}");
    }

    out
}

/// Header row, value row, then the bitmap words one per line.
pub fn render_csv(stats: &SchedulerStats) -> String {
    let mut out = String::with_capacity(256);

    let _ = writeln!(
        out,
        "limit,dropped,enqueues,dequeues,bytes,non_priority_tagged,illegal_priority"
    );
    let _ = writeln!(
        out,
        "{},{},{},{},{},{},{}",
        stats.limit,
        stats.evicted,
        stats.packets,
        stats.dequeued,
        stats.bytes,
        stats.non_priority_tagged,
        stats.illegal_priority
    );
    let _ = writeln!(out, "bitmap");
    for word in &stats.bitmap {
        let _ = writeln!(out, "{word:08x}");
    }

    out
}

fn counter(out: &mut String, name: &str, help: &str, value: u64) {
    let _ = writeln!(out, "# HELP {name} {help}");
    let _ = writeln!(out, "# TYPE {name} counter");
    let _ = writeln!(out, "{name} {value}");
}

fn gauge(out: &mut String, name: &str, help: &str, value: u64) {
    let _ = writeln!(out, "# HELP {name} {help}");
    let _ = writeln!(out, "# TYPE {name} gauge");
    let _ = writeln!(out, "{name} {value}");
}

/// Prometheus text exposition format.
pub fn render_prometheus(stats: &SchedulerStats) -> String {
    let mut out = String::with_capacity(2048);

    // ── Gauges ──────────────────────────────────────────────────

    gauge(
        &mut out,
        "pfabric_limit_packets",
        "Configured buffer limit in packets.",
        stats.limit.into(),
    );
    gauge(
        &mut out,
        "pfabric_dequeue_enabled",
        "Whether dequeue is enabled (1) or paused (0).",
        u64::from(stats.dequeue_enabled),
    );
    gauge(
        &mut out,
        "pfabric_backlog_packets",
        "Packets currently queued.",
        stats.backlog as u64,
    );
    gauge(
        &mut out,
        "pfabric_backlog_bytes",
        "Bytes currently queued.",
        stats.backlog_bytes,
    );

    // ── Counters ────────────────────────────────────────────────

    counter(
        &mut out,
        "pfabric_packets_total",
        "Packets admitted into a band.",
        stats.packets,
    );
    counter(
        &mut out,
        "pfabric_bytes_total",
        "Bytes admitted into a band.",
        stats.bytes,
    );
    counter(
        &mut out,
        "pfabric_accepted_total",
        "Enqueues that stayed within the limit.",
        stats.accepted,
    );
    counter(
        &mut out,
        "pfabric_congested_total",
        "Enqueues that triggered an eviction.",
        stats.congested,
    );
    counter(
        &mut out,
        "pfabric_hard_dropped_total",
        "Packets rejected without being queued.",
        stats.hard_dropped,
    );
    counter(
        &mut out,
        "pfabric_evicted_total",
        "Queued packets released by the drop procedure.",
        stats.evicted,
    );
    counter(
        &mut out,
        "pfabric_dequeued_total",
        "Packets handed out by dequeue.",
        stats.dequeued,
    );
    counter(
        &mut out,
        "pfabric_non_priority_tagged_total",
        "Packets without a priority placed in the fallback band.",
        stats.non_priority_tagged,
    );
    counter(
        &mut out,
        "pfabric_illegal_priority_total",
        "Packets discarded for an out-of-range priority.",
        stats.illegal_priority,
    );
    counter(
        &mut out,
        "pfabric_inconsistencies_total",
        "Internal invariant violations.",
        stats.inconsistencies,
    );

    // ── Per-band ────────────────────────────────────────────────

    let _ = writeln!(
        out,
        "# HELP pfabric_band_accepted_total Admissions per priority band."
    );
    let _ = writeln!(out, "# TYPE pfabric_band_accepted_total counter");
    for (band, count) in stats.per_band_accepted.iter().enumerate() {
        let _ = writeln!(out, "pfabric_band_accepted_total{{band=\"{band}\"}} {count}");
    }

    let _ = writeln!(
        out,
        "# HELP pfabric_band_occupied Whether the band currently holds packets."
    );
    let _ = writeln!(out, "# TYPE pfabric_band_occupied gauge");
    for band in 0..stats.per_band_accepted.len() {
        let word = stats.bitmap.get(band / 32).copied().unwrap_or(0);
        let bit = (word >> (band % 32)) & 1;
        let _ = writeln!(out, "pfabric_band_occupied{{band=\"{band}\"}} {bit}");
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SchedulerStats {
        let mut stats = SchedulerStats::new(4, 15, false);
        stats.packets = 10;
        stats.bytes = 15_000;
        stats.hard_dropped = 2;
        stats.evicted = 1;
        stats.dequeued = 6;
        stats.non_priority_tagged = 1;
        stats.per_band_accepted = vec![4, 0, 6, 0];
        stats.bitmap = vec![0b0101];
        stats.backlog = 3;
        stats
    }

    #[test]
    fn text_report_lists_bands_and_bitmap() {
        let text = render_text(&sample());
        assert!(text.starts_with("limit: 15\n"));
        assert!(text.contains("disable_dequeue: 1\n"));
        assert!(text.contains("\ndropped: 1\n"));
        assert!(text.contains("hard dropped: 2\n"));
        assert!(text.contains("bitmap:\n00000005\n"));
        assert!(text.contains("Band 2: 6\n"));
        assert!(text.ends_with("Band 3: 0\n"));
    }

    #[test]
    fn csv_report_has_header_and_values() {
        let csv = render_csv(&sample());
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0].split(',').count(), 7);
        assert_eq!(lines[1], "15,1,10,6,15000,1,0");
        assert_eq!(lines[2], "bitmap");
        assert_eq!(lines[3], "00000005");
    }

    #[test]
    fn prometheus_output_has_types_and_labels() {
        let prom = render_prometheus(&sample());
        assert!(prom.contains("# TYPE pfabric_packets_total counter"));
        assert!(prom.contains("pfabric_packets_total 10\n"));
        assert!(prom.contains("pfabric_dequeue_enabled 0\n"));
        assert!(prom.contains("pfabric_band_accepted_total{band=\"2\"} 6\n"));
        assert!(prom.contains("pfabric_band_occupied{band=\"0\"} 1\n"));
        assert!(prom.contains("pfabric_band_occupied{band=\"1\"} 0\n"));
        assert!(prom.contains("pfabric_band_occupied{band=\"2\"} 1\n"));
    }
}
