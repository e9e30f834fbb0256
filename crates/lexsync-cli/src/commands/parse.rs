use crate::support::{print_json, read_fixture_or_exit};
use serde_json::json;

pub fn run(fixture: String, json_output: bool) {
    let tree = read_fixture_or_exit(&fixture, json_output);
    let sections: Vec<&str> = tree.children().iter().map(|section| section.name()).collect();

    if json_output {
        print_json(&json!({
            "fixture": fixture,
            "digest": tree.digest(),
            "sections": sections,
            "xml": tree.to_xml(),
        }));
    } else {
        println!("{}", tree.to_xml_pretty());
    }
}
