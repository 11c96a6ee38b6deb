use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub deliveries_created_total: IntCounter,
    pub claims_total: IntCounterVec,
    pub status_transitions_total: IntCounterVec,
    pub location_pings_total: IntCounter,
    pub images_stored_total: IntCounter,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let deliveries_created_total =
            IntCounter::new("deliveries_created_total", "Total deliveries created")
                .expect("valid deliveries_created_total metric");

        let claims_total = IntCounterVec::new(
            Opts::new("claims_total", "Delivery claims by outcome"),
            &["outcome"],
        )
        .expect("valid claims_total metric");

        let status_transitions_total = IntCounterVec::new(
            Opts::new(
                "status_transitions_total",
                "Applied delivery status transitions by target status",
            ),
            &["status"],
        )
        .expect("valid status_transitions_total metric");

        let location_pings_total =
            IntCounter::new("location_pings_total", "Total rider location pings recorded")
                .expect("valid location_pings_total metric");

        let images_stored_total = IntCounter::new("images_stored_total", "Total images stored")
            .expect("valid images_stored_total metric");

        registry
            .register(Box::new(deliveries_created_total.clone()))
            .expect("register deliveries_created_total");
        registry
            .register(Box::new(claims_total.clone()))
            .expect("register claims_total");
        registry
            .register(Box::new(status_transitions_total.clone()))
            .expect("register status_transitions_total");
        registry
            .register(Box::new(location_pings_total.clone()))
            .expect("register location_pings_total");
        registry
            .register(Box::new(images_stored_total.clone()))
            .expect("register images_stored_total");

        Self {
            registry,
            deliveries_created_total,
            claims_total,
            status_transitions_total,
            location_pings_total,
            images_stored_total,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;
        String::from_utf8(buffer).map_err(|err| format!("metrics are not utf-8: {err}"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
