use axum::Router;
use nodeselector_webhook::{
    config::{Config, PemSource, TlsConfig},
    mutation::{options::MutateOptions, Mutator},
    router, WebhookServer,
};
use rcgen::{CertificateParams, KeyPair};
use std::{net::SocketAddr, sync::Arc};

pub(crate) const MUTATE_OPTIONS: &str = r#"
{
    "nodeselector": {"disktype": "ssd", "node-pool": "batch"},
    "tolerations": [
        {"key": "dedicated", "operator": "Equal", "value": "batch", "effect": "NoSchedule"},
        {"key": "node.kubernetes.io/unreachable", "operator": "Exists", "effect": "NoExecute", "tolerationSeconds": 60}
    ],
    "remove_node_affinity": true
}
"#;

pub(crate) fn mutate_options(remove_node_affinity: bool) -> MutateOptions {
    MutateOptions {
        remove_node_affinity,
        ..MutateOptions::from_json(MUTATE_OPTIONS).expect("test options should be valid")
    }
}

pub(crate) fn app(remove_node_affinity: bool) -> Router {
    router(Mutator::new(
        Arc::new(mutate_options(remove_node_affinity)),
        true,
    ))
}

pub(crate) fn default_test_config() -> Config {
    let key_pair = KeyPair::generate().unwrap();
    let cert = CertificateParams::new(vec!["nodeselector-webhook.default.svc".to_owned()])
        .unwrap()
        .self_signed(&key_pair)
        .unwrap();

    Config {
        addr: SocketAddr::from(([127, 0, 0, 1], 8443)),
        tls_config: TlsConfig {
            cert: PemSource::Inline(cert.pem()),
            key: PemSource::Inline(key_pair.serialize_pem()),
        },
        mutate_options: mutate_options(true),
        verbose: false,
        log_level: "info".to_owned(),
        log_fmt: "json".to_owned(),
        log_no_color: false,
    }
}

pub(crate) async fn app_from_config(config: Config) -> Router {
    let server = WebhookServer::new_from_config(config).await.unwrap();

    server.router()
}
