use std::fmt::Write;

use super::engine_metrics::EngineMetrics;

pub fn render_prometheus(m: &EngineMetrics) -> String {
    let mut out = String::with_capacity(2048);

    write_counter(&mut out, "sentinel_engine_events_received_total", m.events_received_val());
    write_counter(&mut out, "sentinel_engine_events_dropped_total", m.events_dropped_val());
    write_counter(&mut out, "sentinel_engine_configs_evaluated_total", m.configs_evaluated_val());
    write_counter(&mut out, "sentinel_engine_configs_skipped_total", m.configs_skipped_val());
    write_counter(&mut out, "sentinel_engine_evaluation_errors_total", m.evaluation_errors_val());
    write_counter(&mut out, "sentinel_engine_alerts_fired_total", m.alerts_fired_val());
    write_counter(&mut out, "sentinel_engine_resets_total", m.resets_val());
    write_counter(&mut out, "sentinel_engine_notifications_sent_total", m.notifications_sent_val());
    write_counter(&mut out, "sentinel_engine_notifications_failed_total", m.notifications_failed_val());
    write_counter(&mut out, "sentinel_engine_signals_failed_total", m.signals_failed_val());
    write_counter(&mut out, "sentinel_engine_commands_issued_total", m.commands_issued_val());
    write_counter(&mut out, "sentinel_engine_commands_failed_total", m.commands_failed_val());
    write_counter(&mut out, "sentinel_engine_correlations_opened_total", m.correlations_opened_val());
    write_counter(&mut out, "sentinel_engine_correlations_closed_total", m.correlations_closed_val());
    write_counter(&mut out, "sentinel_engine_correlations_expired_total", m.correlations_expired_val());
    write_gauge(&mut out, "sentinel_engine_correlations_open", m.correlations_open_val());

    let (sum, count) = m.script_latency_vals();
    write_summary(&mut out, "sentinel_engine_script_latency_us", sum, count);

    out
}

fn write_counter(out: &mut String, name: &str, val: u64) {
    let _ = writeln!(out, "# TYPE {name} counter");
    let _ = writeln!(out, "{name} {val}");
}

pub fn write_gauge(out: &mut String, name: &str, val: u64) {
    let _ = writeln!(out, "# TYPE {name} gauge");
    let _ = writeln!(out, "{name} {val}");
}

fn write_summary(out: &mut String, name: &str, sum: u64, count: u64) {
    let _ = writeln!(out, "# TYPE {name} summary");
    let _ = writeln!(out, "{name}_sum {sum}");
    let _ = writeln!(out, "{name}_count {count}");
}
