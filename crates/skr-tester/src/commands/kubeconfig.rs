use skr_e2e_core::keb::BrokerApi;
use skr_e2e_core::validation::{OidcConfig, ensure_kubeconfig_mentions_oidc};
use skr_e2e_core::workflows::save_kubeconfig;
use tracing::info;

use crate::cli::KubeconfigArgs;
use crate::connection::ConnectionManager;
use crate::error::Result as CliResult;
use crate::output::{OutputFormat, print_output};

/// Only the fields the kubeconfig check looks at are populated
fn expected_oidc(args: &KubeconfigArgs) -> Option<OidcConfig> {
    match (&args.oidc_issuer_url, &args.oidc_client_id) {
        (Some(issuer_url), Some(client_id)) => Some(OidcConfig {
            client_id: client_id.clone(),
            issuer_url: issuer_url.clone(),
            groups_claim: String::new(),
            username_claim: String::new(),
            username_prefix: String::new(),
            signing_algs: Vec::new(),
        }),
        _ => None,
    }
}

/// `skr-tester kubeconfig`
pub async fn handle_kubeconfig(
    conn_mgr: &ConnectionManager,
    args: &KubeconfigArgs,
    output: OutputFormat,
) -> CliResult<()> {
    let keb = conn_mgr.create_keb_client().await?;
    let kubeconfig = keb.kubeconfig(&args.instance_id).await?;

    if let Some(expected) = expected_oidc(args) {
        ensure_kubeconfig_mentions_oidc(&kubeconfig, &expected)?;
        info!("Kubeconfig carries the expected OIDC issuer and client ID");
    }

    if args.save {
        let path = save_kubeconfig(&kubeconfig, args.dir.as_deref()).await?;
        return print_output(
            serde_json::json!({
                "instance_id": args.instance_id,
                "path": path.display().to_string(),
            }),
            output,
        );
    }

    match output {
        OutputFormat::Text => {
            print!("{}", kubeconfig);
            Ok(())
        }
        _ => print_output(
            serde_json::json!({
                "instance_id": args.instance_id,
                "kubeconfig": kubeconfig,
            }),
            output,
        ),
    }
}
