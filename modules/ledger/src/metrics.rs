use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,

    pub ledger_postings_total: IntCounterVec,
    pub ledger_reversals_total: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let ledger_postings_total = IntCounterVec::new(
            Opts::new("ledger_postings_total", "Posting attempts by outcome"),
            &["outcome"], // posted|duplicate|skipped|failed
        )
        .expect("metric");

        let ledger_reversals_total = IntCounterVec::new(
            Opts::new("ledger_reversals_total", "Reversal attempts by result"),
            &["result"], // success|failure
        )
        .expect("metric");

        registry
            .register(Box::new(ledger_postings_total.clone()))
            .expect("register metric");
        registry
            .register(Box::new(ledger_reversals_total.clone()))
            .expect("register metric");

        Self {
            registry,
            ledger_postings_total,
            ledger_reversals_total,
        }
    }

    pub fn record_posting(&self, outcome: &str) {
        self.ledger_postings_total.with_label_values(&[outcome]).inc();
    }

    pub fn record_reversal(&self, result: &str) {
        self.ledger_reversals_total.with_label_values(&[result]).inc();
    }

    pub fn render(&self) -> Result<String, String> {
        let encoder = TextEncoder::new();
        let mf = self.registry.gather();
        let mut buf = Vec::new();
        encoder.encode(&mf, &mut buf).map_err(|e| e.to_string())?;
        String::from_utf8(buf).map_err(|e| e.to_string())
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
