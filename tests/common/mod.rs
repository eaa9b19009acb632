/// Runs a fixture script under `tests/fixtures/<feature>/<name>.lox` through
/// the compiled binary and asserts on its observable behavior.
///
/// `is OK` asserts the process exits successfully and prints exactly the
/// given lines (joined with newlines) to stdout. `is ERR <code>` asserts the
/// process exits with `<code>` and that stderr contains the given message
/// substring somewhere in its output.
#[macro_export]
macro_rules! tests {
    ($name:ident in $feature:ident is OK $($expected:expr)*) => {
        #[test]
        fn $name() {
            use assert_cmd::Command;

            let expected: Vec<&str> = vec![$($expected),*];
            let expected = if expected.is_empty() {
                String::new()
            } else {
                format!("{}\n", expected.join("\n"))
            };

            let fixture = format!("tests/fixtures/{}/{}.lox", stringify!($feature), stringify!($name));

            Command::cargo_bin("slatelox").unwrap()
                .arg(fixture)
                .assert()
                .success()
                .stdout(expected);
        }
    };

    ($name:ident in $feature:ident is ERR $code:expr, $expected:expr) => {
        #[test]
        fn $name() {
            use assert_cmd::Command;
            use predicates::str::contains;

            let fixture = format!("tests/fixtures/{}/{}.lox", stringify!($feature), stringify!($name));

            Command::cargo_bin("slatelox").unwrap()
                .arg(fixture)
                .assert()
                .code($code)
                .stderr(contains($expected));
        }
    };
}
