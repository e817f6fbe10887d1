//! ## herald-telemetry::metrics
//! **Prometheus counters for banner transitions**

use prometheus::{IntCounter, IntCounterVec, Opts, Registry};

#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    pub registry: Registry,
    pub banners_shown: IntCounterVec,
    pub banners_cleared: IntCounter,
    pub delays_suppressed: IntCounter,
    pub clears_deferred: IntCounter,
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRecorder {
    pub fn new() -> Self {
        let registry = Registry::new();

        // Metric names and label sets are static, so construction cannot fail.
        let banners_shown = IntCounterVec::new(
            Opts::new("herald_banners_shown_total", "Banners displayed, by kind"),
            &["kind"],
        )
        .expect("static metric definition");
        let banners_cleared = IntCounter::new(
            "herald_banners_cleared_total",
            "Banners removed after recovery",
        )
        .expect("static metric definition");
        let delays_suppressed = IntCounter::new(
            "herald_delays_suppressed_total",
            "Delay notices ignored because a failure was visible",
        )
        .expect("static metric definition");
        let clears_deferred = IntCounter::new(
            "herald_clears_deferred_total",
            "Success reports postponed by the failure flicker guard",
        )
        .expect("static metric definition");

        for collector in [
            Box::new(banners_shown.clone()) as Box<dyn prometheus::core::Collector>,
            Box::new(banners_cleared.clone()),
            Box::new(delays_suppressed.clone()),
            Box::new(clears_deferred.clone()),
        ] {
            registry
                .register(collector)
                .expect("metric registered twice");
        }

        Self {
            registry,
            banners_shown,
            banners_cleared,
            delays_suppressed,
            clears_deferred,
        }
    }

    pub fn gather_metrics(&self) -> Result<String, prometheus::Error> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::<u8>::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    pub fn inc_shown(&self, kind: &str) {
        self.banners_shown.with_label_values(&[kind]).inc();
    }

    pub fn inc_cleared(&self) {
        self.banners_cleared.inc();
    }

    pub fn inc_suppressed(&self) {
        self.delays_suppressed.inc();
    }

    pub fn inc_deferred(&self) {
        self.clears_deferred.inc();
    }
}
