use tinytest::{methods, Context, Flow, Method, TestCase};

#[derive(Default)]
struct UsageErrorTest;

impl UsageErrorTest {
    fn test_fine(&mut self, ctx: &mut Context<Self>) -> Flow {
        ctx.check(true, "")
    }

    fn test_typo(&mut self, ctx: &mut Context<Self>) -> Flow {
        ctx.delegate(self, "test_fnie")
    }
}

impl TestCase for UsageErrorTest {
    const SOURCE: &'static str = file!();

    fn methods() -> Vec<Method<Self>> {
        methods![test_fine, test_typo]
    }
}

fn main() {
    tinytest::run!(UsageErrorTest);
}
