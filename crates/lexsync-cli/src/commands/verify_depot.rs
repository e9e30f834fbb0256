use crate::support::{load_settings_or_exit, read_fixture_or_exit, report_verification};
use lexsync_depot::{DepotVerifier, RepositoryLocator};
use lexsync_fixture::Side;

pub fn run(config: String, fixture: String, repo: Option<String>, json_output: bool) {
    let settings = load_settings_or_exit(&config);
    let tree = read_fixture_or_exit(&fixture, json_output);
    let root = repo.unwrap_or(settings.repository.root);

    tracing::info!(fixture = %fixture, repo = %root, "verifying repository side");
    let result = DepotVerifier::new(RepositoryLocator::new(&root)).verify(&tree);
    report_verification(&fixture, Side::LanguageDepot, &root, result, json_output);
}
