use clap::builder::PossibleValue;
use clap::{crate_description, crate_name, crate_version, Arg, ArgAction, Command};

pub fn build_cli() -> Command {
    let mut args = vec![
        Arg::new("log-level")
            .long("log-level")
            .value_name("LOG_LEVEL")
            .env("LOG_LEVEL")
            .default_value("info")
            .value_parser([
                PossibleValue::new("trace"),
                PossibleValue::new("debug"),
                PossibleValue::new("info"),
                PossibleValue::new("warn"),
                PossibleValue::new("error"),
            ])
            .help("Log level"),
        Arg::new("log-fmt")
            .long("log-fmt")
            .value_name("LOG_FMT")
            .env("LOG_FMT")
            .default_value("text")
            .value_parser([PossibleValue::new("text"), PossibleValue::new("json")])
            .help("Log output format"),
        Arg::new("log-no-color")
            .long("log-no-color")
            .env("NO_COLOR")
            .action(ArgAction::SetTrue)
            .help("Disable colored output for logs"),
        Arg::new("verbose")
            .long("verbose")
            .env("VERBOSE")
            .action(ArgAction::SetTrue)
            .help("Log the raw AdmissionReview objects received and sent back"),
        Arg::new("address")
            .long("addr")
            .value_name("BIND_ADDRESS")
            .default_value("0.0.0.0")
            .env("BIND_ADDRESS")
            .help("Bind against ADDRESS"),
        Arg::new("port")
            .long("port")
            .value_name("PORT")
            .default_value("8443")
            .env("PORT")
            .help("Listen on PORT"),
        Arg::new("tls-cert")
            .long("tls-cert")
            .value_name("TLS_CERT")
            .env("TLS_CERT")
            .hide_env_values(true)
            .conflicts_with("cert-file")
            .help("PEM encoded X.509 certificate (chain) for HTTPS"),
        Arg::new("tls-key")
            .long("tls-key")
            .value_name("TLS_KEY")
            .env("TLS_KEY")
            .hide_env_values(true)
            .conflicts_with("key-file")
            .help("PEM encoded private key for HTTPS"),
        Arg::new("cert-file")
            .long("cert-file")
            .value_name("CERT_FILE")
            .env("TLS_CERT_FILE")
            .help("Path to an X.509 certificate file for HTTPS, alternative to --tls-cert"),
        Arg::new("key-file")
            .long("key-file")
            .value_name("KEY_FILE")
            .env("TLS_KEY_FILE")
            .help("Path to an X.509 private key file for HTTPS, alternative to --tls-key"),
        Arg::new("mutate-options")
            .long("mutate-options")
            .value_name("MUTATE_OPTIONS")
            .env("MUTATE_OPTIONS")
            .required(true)
            .help("JSON object with the nodeselector, tolerations and remove_node_affinity to enforce"),
    ];
    args.sort_by(|a, b| a.get_id().cmp(b.get_id()));

    Command::new(crate_name!())
        .version(crate_version!())
        .about(crate_description!())
        .args(args)
}
