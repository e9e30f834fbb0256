use crate::support::{load_settings_or_exit, read_fixture_or_exit, report_verification};
use lexsync_docstore::{
    DocumentStore, DocumentVerifier, JsonlDumpStore, MongoExportStore, database_name,
};
use lexsync_fixture::Side;

pub struct Args {
    pub config: String,
    pub fixture: String,
    pub project: String,
    pub dump_dir: Option<String>,
    pub json: bool,
}

pub fn run(args: Args) {
    let settings = load_settings_or_exit(&args.config);
    let tree = read_fixture_or_exit(&args.fixture, args.json);
    let database = database_name(&settings.mongo.database_prefix, &args.project);

    let (store, target): (Box<dyn DocumentStore>, String) = match args.dump_dir {
        Some(dir) => {
            let target = format!("{dir} ({database})");
            (Box::new(JsonlDumpStore::new(dir)), target)
        }
        None => {
            let store = MongoExportStore::new(settings.mongo.host, settings.mongo.port)
                .with_program(settings.mongo.export_command);
            let target = format!("{}/{database}", store.address());
            (Box::new(store), target)
        }
    };

    tracing::info!(fixture = %args.fixture, target = %target, "verifying document side");
    let result = DocumentVerifier::new(store.as_ref(), database).verify(&tree);
    report_verification(&args.fixture, Side::Mongo, &target, result, args.json);
}
