use std::io::Write;

use ateco_core::catalog::load_catalog;
use ateco_core::corpus::build_corpus;

#[test]
fn catalog_to_corpus_pipeline() {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    write!(
        f,
        "code,title,descriptor,hierarchy,activity\n\
         01.11,Cereal farming,\"Includes:\n* wheat growing\n* maize growing\",A > Crops,farming\n\
         11.02,Wine production,\"Includes:\n* wine bottling\",C > Beverages,manufacturing\n\
         99.00,Placeholder,,Z > Other,\n"
    )
    .unwrap();

    let entries = load_catalog(f.path()).expect("load");
    assert_eq!(entries.len(), 3);

    let records = build_corpus(&entries);
    // Two fragments for 01.11, one for 11.02, none for the empty descriptor.
    assert_eq!(records.len(), 3);
    assert!(records.iter().all(|r| r.id < records.len()));
    assert!(records[0].text.contains("Includes wheat growing"));
    assert!(records[1].text.contains("Includes maize growing"));
    assert_eq!(records[2].meta.code, "11.02");
    assert_eq!(records[2].meta.activity.as_deref(), Some("manufacturing"));
}
