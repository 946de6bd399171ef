use super::*;

//-----------------------------------------------------------------------------

fn fields(values: &[&str]) -> Option<Vec<String>> {
    Some(values.iter().map(|x| x.to_string()).collect())
}

#[test]
fn split_alignment_record() {
    let line = "v1;c1;0.9;1;10;1e-5\n";
    assert_eq!(split_fields(line, SEPARATOR, 6), fields(&["v1", "c1", "0.9", "1", "10", "1e-5"]));
}

#[test]
fn split_trims_whitespace() {
    let line = "  v1 ;\tc1;0.9 ; 1;10;1e-5 \r\n";
    assert_eq!(split_fields(line, SEPARATOR, 6), fields(&["v1", "c1", "0.9", "1", "10", "1e-5"]));
}

#[test]
fn split_keeps_extra_fields() {
    let line = "AT1G01010;seqA;ath;extra";
    assert_eq!(split_fields(line, SEPARATOR, 3), fields(&["AT1G01010", "seqA", "ath", "extra"]));
}

#[test]
fn split_missing_fields() {
    assert_eq!(split_fields("v1\n", SEPARATOR, 6), None, "A record without separators was accepted");
    assert_eq!(split_fields("v1;c1;0.9;1;10", SEPARATOR, 6), None, "A record with five fields was accepted");
    assert_eq!(split_fields("", SEPARATOR, 2), None, "An empty record was accepted");
}

#[test]
fn split_empty_fields_count() {
    assert_eq!(split_fields(";;", SEPARATOR, 3), fields(&["", "", ""]));
}

//-----------------------------------------------------------------------------

#[test]
fn stats_report() {
    let stats = Statistics {
        seqnum_acrogymnospermae: 5000,
        clusternum_total: 800,
        clusternum_interproscan_annotations: 300,
        clusternum_emapper_annotations: 250,
        clusternum_tair10_orthologs: 120,
        clusternum_without_annotations: 400,
    };
    let mut buffer: Vec<u8> = Vec::new();
    let result = write_stats_report(&mut buffer, &stats);
    assert!(result.is_ok(), "Failed to write the report: {}", result.unwrap_err());
    let expected = "[statistics]\n\
        seqnum_acrogymnospermae = 5000\n\
        clusternum_total = 800\n\
        clusternum_interproscan_annotations = 300\n\
        clusternum_emapper_annotations = 250\n\
        clusternum_tair10_ortologs = 120\n\
        clusternum_without_annotations = 400\n";
    assert_eq!(String::from_utf8(buffer).unwrap(), expected);
}

#[test]
fn gzipped_stats_file() {
    let dir = tempfile::tempdir().unwrap();
    let filename = dir.path().join("stats.txt.gz");
    let stats = Statistics { clusternum_total: 3, ..Statistics::default() };
    let result = write_stats_file(&filename, &stats);
    assert!(result.is_ok(), "Failed to write the report: {}", result.unwrap_err());

    let mut reader = utils::open_file(&filename).unwrap();
    let mut lines = Vec::new();
    while let Some(line) = utils::read_line(reader.as_mut(), &filename).unwrap() {
        lines.push(line);
    }
    assert_eq!(lines.len(), 7, "Wrong number of lines");
    assert_eq!(lines[0], "[statistics]");
    assert_eq!(lines[2], "clusternum_total = 3");
    assert_eq!(lines[5], "clusternum_tair10_ortologs = 0");
}

#[test]
fn haplotype_csv() {
    let mut buffer: Vec<u8> = Vec::new();
    write_haplotype_header(&mut buffer).unwrap();
    write_haplotype_row(&mut buffer, 2, "loc1").unwrap();
    let expected = "\"haplotype number\",\"locus identification\"\n2,\"locus_loc1\"\n";
    assert_eq!(String::from_utf8(buffer).unwrap(), expected);
}

#[test]
fn haplotype_row_is_latin1() {
    let mut buffer: Vec<u8> = Vec::new();
    write_haplotype_row(&mut buffer, 1, "Pinús").unwrap();
    let expected: Vec<u8> = [&b"1,\"locus_Pin"[..], &[0xFAu8][..], &b"s\"\n"[..]].concat();
    assert_eq!(buffer, expected, "The row is not ISO-8859-1");
}

//-----------------------------------------------------------------------------
