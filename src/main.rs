use env_logger::Env;

use tagrun::error::ConfigError;
use tagrun::filter::FilterGroup;
use tagrun::here;
use tagrun::runner::capture::AssertionRecorder;
use tagrun::runner::result::{Counts, Totals};
use tagrun::session::{InstanceFlag, SENTINEL_EXIT_CODE, Session};
use tagrun::testcase::TestCaseInfo;
use tagrun::testcase::expr::TagExpr;
use tagrun::testcase::registry::TestRegistry;

static INSTANCE: InstanceFlag = InstanceFlag::new();

fn info(name: &str, description: &str) -> TestCaseInfo {
    TestCaseInfo::new(name, "", description, here!())
}

/// The built-in suite: checks the engine against itself.
fn self_check_suite() -> Result<TestRegistry, ConfigError> {
    let mut reg = TestRegistry::new();

    reg.add("tag expressions evaluate", "[unit][expr]", here!(), |r: &mut AssertionRecorder| {
        let tags = info("t", "[fast][db]").tags().clone();
        match TagExpr::parse("[fast]~[slow],([db][net])") {
            Ok(expr) => {
                r.check(expr.matches(&tags), "expr.matches(&tags)");
            }
            Err(e) => r.fail(e.to_string()),
        }
        r.check(TagExpr::parse("[unterminated").is_err(), "unterminated tag rejected");
    })?;

    reg.add("name patterns select tests", "[unit][filter]", here!(), |r: &mut AssertionRecorder| {
        let group = FilterGroup::parse("g", &["adds*", "~*slowly"]);
        match group {
            Ok(group) => {
                r.check(group.should_include(&info("adds numbers", "")), "prefix match");
                r.check(!group.should_include(&info("adds slowly", "")), "exclusion wins");
                r.check(!group.should_include(&info("divides", "")), "no match");
            }
            Err(e) => r.fail(e.to_string()),
        }
    })?;

    reg.add("hidden tests need explicit selection", "[unit][filter]", here!(), |r: &mut AssertionRecorder| {
        let secret = info("secret", "[hide][db]");
        r.check(secret.is_hidden(), "secret.is_hidden()");
        r.check(!FilterGroup::match_all("").should_include(&secret), "match-all skips hidden");
        let by_tag = FilterGroup::parse("db", &["[db]"]);
        r.check(
            by_tag.is_ok_and(|g| g.should_include(&secret)),
            "tag selection picks hidden",
        );
    })?;

    reg.add("totals combine", "[unit]", here!(), |r: &mut AssertionRecorder| {
        let pass = Totals::for_test(Counts { passed: 2, ..Counts::default() }, false);
        let fail = Totals::for_test(Counts { passed: 1, failed: 1, skipped: 0 }, false);
        r.check_eq(pass + fail, fail + pass, "addition commutes");
        r.check_eq((pass + fail) - pass, fail, "subtraction gives delta");
    })?;

    reg.add("skipped without network", "[integration][net]", here!(), |r: &mut AssertionRecorder| {
        r.skip("network checks are not part of the self-check");
    })?;

    reg.add("./scratch", "scratch space for local experiments", here!(), |r: &mut AssertionRecorder| {
        r.check(true, "true");
    })?;

    reg.add("deliberate failure", "[.][demo] shows how failures are reported", here!(), |r: &mut AssertionRecorder| {
        r.check_eq(2 + 2, 5, "2 + 2 == 5");
    })?;

    reg.add("deliberate panic", "[.][demo] shows how faults are reported", here!(), |_: &mut AssertionRecorder| {
        panic!("deliberate fault raised inside a test body");
    })?;

    Ok(reg)
}

fn main() {
    let tests = match self_check_suite() {
        Ok(tests) => tests,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(SENTINEL_EXIT_CODE);
        }
    };

    let mut session = match Session::new(&INSTANCE, &tests) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(SENTINEL_EXIT_CODE);
        }
    };

    let code = session.apply_command_line(std::env::args_os());
    let level = if session.config_data().verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    let code = if code == 0 { session.run() } else { code };
    std::process::exit(code);
}
