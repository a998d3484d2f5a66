//! gstat 报告解析集成测试

use firebird_diag_parser::{
    DbAttribute, Input, ParseError, StatReportParser, parse_report, parse_report_from_str,
};

/// `gstat -r -e` 风格的输出
const FULL_REPORT: &str = r#"
Database "/opt/firebird/examples/empbuild/employee.fdb"
Gstat execution time Wed Apr 04 15:41:34 2018

Database header page information:
        Flags                   0
        Generation              2844
        System Change Number    24
        Page size               8192
        ODS version             12.0
        Oldest transaction      2828
        Oldest active           2829
        Oldest snapshot         2829
        Next transaction        2832
        Sequence number         0
        Next attachment ID      1220
        Implementation          HW=AMD/Intel/x64 little-endian OS=Linux CC=gcc
        Shadow count            0
        Page buffers            0
        Next header page        0
        Database dialect        3
        Creation date           Nov 27, 2015 11:19:39
        Attributes              force write, no reserve

    Variable header data:
        Sweep interval:         20000
        *END*

Data pages: total 121, encrypted 0, non-crypted 121
Index pages: total 96, encrypted 0, non-crypted 96
Blob pages: total 11, encrypted 0, non-crypted 11

Analyzing database pages ...
COUNTRY (128)
    Primary pointer page: 182, Index root page: 183
    Total formats: 1, used formats: 1
    Average record length: 25.57, total records: 14
    Average version length: 0.00, total versions: 0, max versions: 0
    Average fragment length: 0.00, total fragments: 0, max fragments: 0
    Average unpacked length: 34.00, compression ratio: 1.33
    Pointer pages: 1, data page slots: 1
    Data pages: 1, average fill: 8%
    Primary pages: 1, secondary pages: 0, swept pages: 0
    Empty pages: 0, full pages: 0
    Fill distribution:
         0 - 19% = 1
        20 - 39% = 0
        40 - 59% = 0
        60 - 79% = 0
        80 - 99% = 0

    Index RDB$PRIMARY1 (0)
        Root page: 186, depth: 1, leaf buckets: 1, nodes: 14
        Average node length: 10.43, total dup: 0, max dup: 0
        Average key length: 8.14, compression ratio: 1.12
        Average prefix length: 0.71, average data length: 8.43
        Clustering factor: 1, ratio: 0.07
        Fill distribution:
             0 - 19% = 1
            20 - 39% = 0
            40 - 59% = 0
            60 - 79% = 0
            80 - 99% = 0

JOB (129)
    Primary pointer page: 189, Index root page: 190
    Total formats: 1, used formats: 1
    Average record length: 68.86, total records: 31
    Average version length: 0.00, total versions: 0, max versions: 0
    Average fragment length: 0.00, total fragments: 0, max fragments: 0
    Average unpacked length: 96.00, compression ratio: 1.39
    Pointer pages: 1, data page slots: 2
    Data pages: 2, average fill: 57%
    Primary pages: 1, secondary pages: 1, swept pages: 0
    Empty pages: 0, full pages: 1
    Blobs: 39, total length: 4840, blob pages: 0
        Level 0: 39, Level 1: 0, Level 2: 0
    Fill distribution:
         0 - 19% = 0
        20 - 39% = 1
        40 - 59% = 0
        60 - 79% = 0
        80 - 99% = 1

    Index MAXSALX (2)
        Root page: 192, depth: 1, leaf buckets: 1, nodes: 31
        Average node length: 18.87, total dup: 5, max dup: 1
        Average key length: 15.97, compression ratio: 1.28
        Average prefix length: 5.68, average data length: 14.71
        Clustering factor: 6, ratio: 0.19
        Fill distribution:
             0 - 19% = 1
            20 - 39% = 0
            40 - 59% = 0
            60 - 79% = 0
            80 - 99% = 0

    Index RDB$FOREIGN3 (1)
        Root page: 196, depth: 1, leaf buckets: 1, nodes: 31
        Average node length: 10.90, total dup: 24, max dup: 20
        Average key length: 8.06, compression ratio: 0.50
        Average prefix length: 3.23, average data length: 0.81
        Clustering factor: 1, ratio: 0.03
        Fill distribution:
             0 - 19% = 1
            20 - 39% = 0
            40 - 59% = 0
            60 - 79% = 0
            80 - 99% = 0

Gstat completion time Wed Apr 04 15:41:35 2018
"#;

#[test]
fn test_full_report() {
    let report = parse_report_from_str(FULL_REPORT).unwrap();

    assert!(report.is_frozen());
    assert_eq!(report.gstat_version, Some(3));
    assert_eq!(report.attributes, vec![DbAttribute::Write, DbAttribute::NoReserve]);
    assert_eq!(report.sweep_interval, Some(20000));
    assert_eq!(report.next_attachment_id, 1220);

    assert!(report.has_table_stats());
    assert!(report.has_row_stats());
    assert!(report.has_index_stats());
    assert!(report.has_encryption_stats());
    assert!(!report.has_system_tables());

    assert_eq!(report.tables().len(), 2);
    assert_eq!(report.indices().len(), 3);

    let job = report.table("JOB").unwrap();
    assert_eq!(job.total_records, Some(31));
    assert_eq!(job.blobs, Some(39));
    assert_eq!(job.blobs_total_length, Some(4840));
    assert_eq!(job.level_0, Some(39));
    assert_eq!(job.distribution().map(|d| (d.d40, d.d100)), Some((1, 1)));

    let names: Vec<_> = report.indices_of(job).map(|i| i.name.as_str()).collect();
    assert_eq!(names, ["MAXSALX", "RDB$FOREIGN3"]);

    let foreign = report.index("RDB$FOREIGN3").unwrap();
    assert_eq!(foreign.total_dup, Some(24));
    assert_eq!(foreign.max_dup, Some(20));
    assert_eq!(report.table_of(foreign).unwrap().name, "JOB");
}

#[test]
fn test_index_parents_are_in_tables() {
    let report = parse_report_from_str(FULL_REPORT).unwrap();
    for index in report.indices() {
        let parent = report.table_of(index).unwrap();
        assert!(report.tables().iter().any(|t| std::ptr::eq(t, parent)));
    }
}

#[test]
fn test_parser_reuse_across_documents() {
    let mut parser = StatReportParser::new();
    for line in FULL_REPORT.lines() {
        parser.push(line).unwrap();
    }
    parser.push(Input::End).unwrap();
    assert_eq!(parser.report().tables().len(), 2);

    // 冻结后直接推送下一份报告，解析器自动重置
    for line in ["Database header page information:", "System Change Number    99", ""] {
        parser.push(line).unwrap();
    }
    parser.push(Input::End).unwrap();

    let report = parser.into_report();
    assert_eq!(report.system_change_number, Some(99));
    assert!(report.tables().is_empty());
    assert!(report.encrypted_data_pages.is_none());
}

#[test]
fn test_error_line_numbers() {
    let err = parse_report(["", "Database header page information:", "Page size  x"]).unwrap_err();
    assert_eq!(err.line(), Some(3));
    assert_eq!(err.to_string(), "failed to parse integer value 'x' (line 3)");

    let err = parse_report(["Checksum 1"]).unwrap_err();
    assert_eq!(err, ParseError::UnrecognizedData { line: 1 });
}

#[test]
fn test_crlf_lines() {
    let text = "Database header page information:\r\n        Page size               4096\r\n\r\n";
    let report = parse_report_from_str(text).unwrap();
    assert_eq!(report.page_size, 4096);
}

#[cfg(feature = "serde")]
#[test]
fn test_serde_round_trip() {
    let report = parse_report_from_str(FULL_REPORT).unwrap();

    let json = serde_json::to_value(&report.tables()[0]).unwrap();
    assert_eq!(
        json["distribution"],
        serde_json::json!({"d20": 1, "d40": 0, "d60": 0, "d80": 0, "d100": 0})
    );

    let text = serde_json::to_string(&report).unwrap();
    let back: firebird_diag_parser::StatReport = serde_json::from_str(&text).unwrap();
    assert_eq!(back, report);
    assert_eq!(back.tables()[1].distribution(), report.tables()[1].distribution());
}
