use std::fs;

use anyhow::Result;
use tempfile::tempdir;
use voiceprep::ingest::descriptor::DescriptorTable;
use voiceprep::ScanOrder;

const GEMAPS: &str = "\
@relation 'openSMILE_features'
@attribute name string
@attribute jitterLocal_sma3nz_amean numeric
@data
'unknown',0.021
";

#[test]
fn load_dir_keeps_only_well_formed_descriptors() -> Result<()> {
    let temp = tempdir()?;
    let dir = temp.path();
    fs::write(dir.join("100.m4a_gemaps.arff"), GEMAPS)?;
    fs::write(dir.join("101.m4a_gemaps.arff"), GEMAPS.replace("0.021", "0.034"))?;
    fs::write(dir.join("102.m4a_gemaps.txt"), GEMAPS)?;
    fs::write(dir.join("gemaps.arff"), GEMAPS)?;
    fs::write(dir.join("103.m4a_gemaps.arff"), "@attribute x numeric\n")?;
    fs::write(dir.join("104.m4a_gemaps.arff"), "not an arff file\n")?;
    fs::create_dir(dir.join("105.arff"))?;

    let table = DescriptorTable::load_dir(dir, ScanOrder::ByName)?;
    let ids: Vec<&str> = table.rows.iter().map(|row| row.file_id.as_str()).collect();
    assert_eq!(ids, vec!["100", "101"]);
    assert_eq!(table.columns, vec!["name", "jitterLocal_sma3nz_amean"]);
    assert_eq!(
        table.column("jitterLocal_sma3nz_amean"),
        Some(vec![Some(0.021), Some(0.034)])
    );
    Ok(())
}

#[test]
fn load_dir_fails_for_missing_directory() {
    let temp = tempdir().unwrap();
    assert!(DescriptorTable::load_dir(&temp.path().join("absent"), ScanOrder::ByName).is_err());
}
