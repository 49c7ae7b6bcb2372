pub mod engine_metrics;
pub mod exposition;

pub use engine_metrics::EngineMetrics;

#[cfg(test)]
mod tests {
    use super::exposition::render_prometheus;
    use super::EngineMetrics;
    use std::time::Instant;

    #[test]
    fn counters_increment() {
        let m = EngineMetrics::new();
        m.inc_alerts_fired();
        m.inc_alerts_fired();
        m.inc_resets();
        assert_eq!(m.alerts_fired_val(), 2);
        assert_eq!(m.resets_val(), 1);
    }

    #[test]
    fn open_correlations_gauge() {
        let m = EngineMetrics::new();
        for _ in 0..3 {
            m.inc_correlations_opened();
        }
        m.inc_correlations_closed();
        m.add_correlations_expired(1);
        assert_eq!(m.correlations_open_val(), 1);
    }

    #[test]
    fn script_latency_recording() {
        let m = EngineMetrics::new();
        let start = Instant::now();
        std::thread::sleep(std::time::Duration::from_millis(1));
        m.record_script_latency(start);
        let (sum, count) = m.script_latency_vals();
        assert!(sum > 0);
        assert_eq!(count, 1);
    }

    #[test]
    fn prometheus_output_contains_metric_names() {
        let m = EngineMetrics::new();
        m.inc_events_received();
        m.inc_commands_issued();
        let output = render_prometheus(&m);
        assert!(output.contains("sentinel_engine_events_received_total 1"));
        assert!(output.contains("sentinel_engine_commands_issued_total 1"));
        assert!(output.contains("# TYPE sentinel_engine_correlations_open gauge"));
        assert!(output.contains("# TYPE sentinel_engine_script_latency_us summary"));
    }
}
