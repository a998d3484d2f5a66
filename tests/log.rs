//! 服务器日志解析集成测试

use std::collections::BTreeMap;

use firebird_diag_parser::{
    Classification, Facility, Input, LogParser, MessageClassifier, MessageTemplate, ParamValue,
    Severity,
};

const LOG: &str = "
MyServer (Client)\tFri Apr  6 16:35:46 2018
\tINET/inet_error: connect errno = 111


MyServer (Client)\tFri Apr  6 16:51:31 2018
\t/opt/firebird/bin/fbguard: guardian starting /opt/firebird/bin/fbserver



MyServer (Server)\tFri Apr  6 16:55:31 2018
\tSweep is started by SYSDBA
\tDatabase \"/home/db/test_employee.fdb\"
\tOIT 1, OAT 0, OST 0, Next 1


MyServer (Server)\tFri Apr  6 16:55:31 2018
\tSweep is finished
\tDatabase \"/home/db/test_employee.fdb\"
\tOIT 1, OAT 0, OST 0, Next 2
";

/// 只认识清理（sweep）消息的目录
struct SweepCatalog;

impl MessageClassifier for SweepCatalog {
    fn classify(&self, text: &str) -> Option<Classification> {
        let mut lines = text.lines();
        let first = lines.next()?;
        let (code, template, mut params) = if let Some(user) = first.strip_prefix("Sweep is started by ") {
            let mut params = BTreeMap::new();
            params.insert("user".to_string(), ParamValue::from(user));
            (126, "Sweep is started by {user}", params)
        } else if first == "Sweep is finished" {
            (127, "Sweep is finished", BTreeMap::new())
        } else {
            return None;
        };

        let database = lines.next()?.strip_prefix("Database \"")?.strip_suffix('"')?;
        params.insert("database".to_string(), ParamValue::from(database));

        let counters = lines.next()?;
        for part in counters.split(", ") {
            let (name, value) = part.split_once(' ')?;
            params.insert(name.to_lowercase(), ParamValue::Int(value.parse().ok()?));
        }

        Some(Classification {
            severity: Severity::Info,
            code,
            facility: Facility::Sweep,
            template: MessageTemplate::new()
                .text(template)
                .text("\nDatabase \"{database}\"")
                .text("\nOIT {oit}, OAT {oat}, OST {ost}, Next {next}"),
            without_optional: false,
            params,
        })
    }
}

#[test]
fn test_parse_unclassified() {
    let mut parser = LogParser::new();
    let messages: Vec<_> = parser.parse(LOG.lines()).map(Result::unwrap).collect();

    assert_eq!(messages.len(), 4);
    assert!(messages.iter().all(|m| m.code == 0 && m.params.is_empty()));
    assert_eq!(messages[0].message, "INET/inet_error: connect errno = 111");
    assert_eq!(
        messages[2].message,
        "Sweep is started by SYSDBA\nDatabase \"/home/db/test_employee.fdb\"\nOIT 1, OAT 0, OST 0, Next 1"
    );
}

#[test]
fn test_parse_and_push_agree() {
    let mut parser = LogParser::with_classifier(SweepCatalog);
    let parsed: Vec<_> = parser.parse(LOG.lines()).map(Result::unwrap).collect();

    let mut pushed = Vec::new();
    for line in LOG.lines() {
        if let Some(message) = parser.push(line).unwrap() {
            pushed.push(message);
        }
    }
    pushed.extend(parser.push(Input::End).unwrap());

    assert_eq!(parsed, pushed);
}

#[test]
fn test_classified_sweep_messages() {
    let mut parser = LogParser::with_classifier(SweepCatalog);
    let messages: Vec<_> = parser.parse(LOG.lines()).map(Result::unwrap).collect();

    let started = &messages[2];
    assert_eq!(started.code, 126);
    assert_eq!(started.severity, Severity::Info);
    assert_eq!(started.facility, Facility::Sweep);
    assert_eq!(started.params["user"], ParamValue::from("SYSDBA"));
    assert_eq!(started.params["next"], ParamValue::Int(1));
    assert_eq!(started.render(), messages_text(2));

    let finished = &messages[3];
    assert_eq!(finished.code, 127);
    assert_eq!(finished.params["next"], ParamValue::Int(2));
    assert!(!finished.params.contains_key("user"));

    // 同一时间戳的两条消息按来源、代码排序
    assert!(started < finished);
}

fn messages_text(index: usize) -> String {
    let mut parser = LogParser::new();
    parser
        .parse(LOG.lines())
        .nth(index)
        .unwrap()
        .unwrap()
        .message
}
