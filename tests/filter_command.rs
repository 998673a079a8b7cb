use buildlog::config::FilterCommand;
use buildlog::errors::BuildLogError;
use proptest::prelude::*;

fn argv_of(raw: &str) -> Vec<String> {
    FilterCommand::parse(raw)
        .expect("valid quoting")
        .expect("non-empty command")
        .argv()
        .to_vec()
}

#[test]
fn splits_on_whitespace() {
    assert_eq!(argv_of("grep -v   debug"), ["grep", "-v", "debug"]);
    assert_eq!(argv_of("\tcat\n"), ["cat"]);
}

#[test]
fn honours_quotes_and_escapes() {
    assert_eq!(
        argv_of(r#"sed -e 's/a b/c/' "two words" escaped\ space"#),
        ["sed", "-e", "s/a b/c/", "two words", "escaped space"]
    );
    assert_eq!(argv_of(r#"echo "say \"hi\"""#), ["echo", r#"say "hi""#]);
    assert_eq!(argv_of("printf ''"), ["printf", ""]);
}

#[test]
fn hash_is_an_ordinary_character() {
    assert_eq!(argv_of("grep -v #include"), ["grep", "-v", "#include"]);
    assert_eq!(argv_of("#tag"), ["#tag"]);
    assert_eq!(argv_of("sed -e s/a/b/ #x"), ["sed", "-e", "s/a/b/", "#x"]);
    assert_eq!(argv_of("echo a#b '#q' \\#e"), ["echo", "a#b", "#q", "#e"]);
    assert_eq!(argv_of("grep -v\t#x\n#y"), ["grep", "-v", "#x", "#y"]);
}

#[test]
fn program_and_args_are_split() {
    let cmd = FilterCommand::parse("tr a-z A-Z")
        .expect("valid quoting")
        .expect("non-empty command");
    assert_eq!(cmd.program(), "tr");
    assert_eq!(cmd.args(), ["a-z", "A-Z"]);
}

#[test]
fn blank_input_is_no_filter() {
    for raw in ["", "   ", "\t\n"] {
        assert!(
            FilterCommand::parse(raw).expect("valid quoting").is_none(),
            "{raw:?} should mean no filter"
        );
    }
    assert!(FilterCommand::from_argv(Vec::new()).is_none());
}

#[test]
fn unbalanced_quoting_is_a_config_error() {
    for raw in ["sed 's/a/b/", "echo \"unterminated", "trailing\\"] {
        assert!(
            matches!(FilterCommand::parse(raw), Err(BuildLogError::ConfigError(_))),
            "{raw:?} should be rejected"
        );
    }
}

#[test]
fn display_quotes_arguments_that_need_it() {
    let cmd = FilterCommand::from_argv(vec!["grep".into(), "-v".into(), "two words".into()])
        .expect("non-empty argv");
    assert_eq!(cmd.to_string(), "grep -v 'two words'");
}

proptest! {
    #[test]
    fn plain_words_split_back_out(words in prop::collection::vec("[a-zA-Z0-9_./-]{1,8}", 1..6)) {
        let raw = words.join(" ");
        let cmd = FilterCommand::parse(&raw).unwrap().unwrap();
        prop_assert_eq!(cmd.argv(), words.as_slice());
    }

    #[test]
    fn display_reparses_to_the_same_argv(
        program in "[a-z]{1,8}",
        args in prop::collection::vec("[a-zA-Z0-9 #'\"._/=-]{1,10}", 0..5),
    ) {
        let mut argv = vec![program];
        argv.extend(args);
        let cmd = FilterCommand::from_argv(argv).unwrap();

        let reparsed = FilterCommand::parse(&cmd.to_string()).unwrap().unwrap();
        prop_assert_eq!(reparsed, cmd);
    }
}
