use std::fmt;
use std::str::FromStr;

use deleter_handle::{Handle, make_handle_in_place, make_handle_with_deleter};
use drop_dispatch::{Base, Class, Dispatch, Leaf, Mid, OtherLeaf, OwningPtr, construct};
use lifetime_trace::{Trace, describe_args, short_type_name};

use crate::{Error, Result, TestObject, TestObjectEx};

/// Width of the separator lines that frame each scenario.
const SEPARATOR_WIDTH: usize = 64;

/// One scripted demonstration.
///
/// Every scenario creates its own objects, lets them go out of scope (or deletes them
/// explicitly) and leaves nothing alive behind, except for the deliberate leak of
/// [`Scenario::OtherLeafViaBase`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum Scenario {
    /// A `Mid` on the stack.
    StackMid,

    /// A `Leaf` on the stack.
    StackLeaf,

    /// A heap `Leaf` deleted through a `Mid` pointer.
    LeafViaMid,

    /// A heap `Mid` deleted through a `Mid` pointer.
    MidViaMid,

    /// A heap `OtherLeaf` deleted through its own pointer.
    OtherLeafViaOtherLeaf,

    /// A heap `OtherLeaf` deleted through a `Base` pointer. Only the `Base` part is torn down.
    OtherLeafViaBase,

    /// A heap `Leaf` deleted through a `Base` pointer.
    LeafViaBase,

    /// A handle released at the end of its block.
    HandleScope,

    /// A handle copied, then the original reset while the copy keeps the object alive.
    HandleReset,

    /// A handle upcast to the `TestObject` view of a `TestObjectEx`.
    HandleUpcast,

    /// A handle with a closure deleter that brackets the deletion with notes.
    HandleLambdaDeleter,
}

impl Scenario {
    /// Every scenario, in the order they run by default.
    pub const ALL: [Self; 11] = [
        Self::StackMid,
        Self::StackLeaf,
        Self::LeafViaMid,
        Self::MidViaMid,
        Self::OtherLeafViaOtherLeaf,
        Self::OtherLeafViaBase,
        Self::LeafViaBase,
        Self::HandleScope,
        Self::HandleReset,
        Self::HandleUpcast,
        Self::HandleLambdaDeleter,
    ];

    /// The name used to select the scenario on the command line.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::StackMid => "stack-mid",
            Self::StackLeaf => "stack-leaf",
            Self::LeafViaMid => "leaf-via-mid",
            Self::MidViaMid => "mid-via-mid",
            Self::OtherLeafViaOtherLeaf => "other-leaf-via-other-leaf",
            Self::OtherLeafViaBase => "other-leaf-via-base",
            Self::LeafViaBase => "leaf-via-base",
            Self::HandleScope => "handle-scope",
            Self::HandleReset => "handle-reset",
            Self::HandleUpcast => "handle-upcast",
            Self::HandleLambdaDeleter => "handle-lambda-deleter",
        }
    }

    /// One line describing what the scenario shows.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::StackMid => "Mid on the stack, destroyed at end of scope",
            Self::StackLeaf => "Leaf on the stack, destroyed at end of scope",
            Self::LeafViaMid => "heap Leaf deleted through a Mid pointer",
            Self::MidViaMid => "heap Mid deleted through a Mid pointer",
            Self::OtherLeafViaOtherLeaf => "heap OtherLeaf deleted through an OtherLeaf pointer",
            Self::OtherLeafViaBase => {
                "heap OtherLeaf deleted through a Base pointer (partial destruction)"
            }
            Self::LeafViaBase => "heap Leaf deleted through a Base pointer",
            Self::HandleScope => "handle released at end of block",
            Self::HandleReset => "original handle reset while a copy keeps the object alive",
            Self::HandleUpcast => "handle upcast to a base view, deleted as the concrete type",
            Self::HandleLambdaDeleter => "handle with a closure deleter",
        }
    }

    /// Runs the scenario, reporting every lifetime event to `trace`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Handle`] if a handle scenario cannot create its object.
    pub fn run(self, trace: &Trace) -> Result<()> {
        match self {
            Self::StackMid => {
                let _mid = construct::<Mid>(trace);
            }
            Self::StackLeaf => {
                let _leaf = construct::<Leaf>(trace);
            }
            Self::LeafViaMid => {
                delete_through(trace, OwningPtr::<Leaf>::construct(trace).upcast::<Mid>());
            }
            Self::MidViaMid => delete_through(trace, OwningPtr::<Mid>::construct(trace)),
            Self::OtherLeafViaOtherLeaf => {
                delete_through(trace, OwningPtr::<OtherLeaf>::construct(trace));
            }
            Self::OtherLeafViaBase => {
                delete_through(
                    trace,
                    OwningPtr::<OtherLeaf>::construct(trace).upcast::<Base>(),
                );
            }
            Self::LeafViaBase => {
                delete_through(trace, OwningPtr::<Leaf>::construct(trace).upcast::<Base>());
            }
            Self::HandleScope => self.handle_scope(trace)?,
            Self::HandleReset => self.handle_reset(trace)?,
            Self::HandleUpcast => self.handle_upcast(trace)?,
            Self::HandleLambdaDeleter => self.handle_lambda_deleter(trace)?,
        }

        Ok(())
    }

    fn handle_scope(self, trace: &Trace) -> Result<()> {
        let object = self.make_object_ex(trace, 100, 1.5)?;

        trace.note("## End Of Block ##");
        drop(object);

        Ok(())
    }

    fn handle_reset(self, trace: &Trace) -> Result<()> {
        let mut original = self.make_object_ex(trace, 200, 2.5)?;

        {
            let copy = original.clone();

            original.reset();
            trace.note(format!(
                "original reset, copy holds {} reference(s)",
                copy.use_count()
            ));
        }

        trace.note("## End Of Block ##");

        Ok(())
    }

    fn handle_upcast(self, trace: &Trace) -> Result<()> {
        let object: Handle<TestObject>;

        {
            let object_ex = self.make_object_ex(trace, 300, 3.5)?;

            object = object_ex.upcast(TestObjectEx::base);
        }

        trace.note(format!("after upcast, value_a = {}", object.value_a()));
        trace.note("## End Of Block ##");
        drop(object);

        Ok(())
    }

    fn handle_lambda_deleter(self, trace: &Trace) -> Result<()> {
        let (value_a, value_b) = (400, 4.5);
        let deleter_trace = trace.clone();

        let object = make_handle_with_deleter(
            trace,
            describe_args!(value_a, value_b),
            |slot| TestObjectEx::init(slot, value_a, value_b, trace),
            move |object: Box<TestObjectEx>| {
                deleter_trace.note("# Begin - Lambda Deleter");
                deleter_trace.deleted(short_type_name::<TestObjectEx>(), &raw const *object);
                drop(object);
                deleter_trace.note("# End - Lambda Deleter");
            },
        )
        .map_err(|source| self.failed(source))?;

        trace.note("## End Of Block ##");
        drop(object);

        Ok(())
    }

    fn make_object_ex(
        self,
        trace: &Trace,
        value_a: i32,
        value_b: f64,
    ) -> Result<Handle<TestObjectEx>> {
        make_handle_in_place(trace, describe_args!(value_a, value_b), |slot| {
            TestObjectEx::init(slot, value_a, value_b, trace)
        })
        .map_err(|source| self.failed(source))
    }

    fn failed(self, source: deleter_handle::Error) -> Error {
        Error::Handle {
            scenario: self.name(),
            source,
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Scenario {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|scenario| scenario.name() == s)
            .ok_or_else(|| Error::UnknownScenario {
                name: s.to_string(),
            })
    }
}

/// Runs `scenarios` in order, each framed by a numbered separator line.
///
/// The number is the scenario's position in [`Scenario::ALL`], so a scenario keeps its number
/// when it runs on its own.
///
/// # Errors
///
/// Stops at the first scenario that fails and returns its error.
pub fn run_scenarios(trace: &Trace, scenarios: &[Scenario]) -> Result<()> {
    for &scenario in scenarios {
        trace.note(separator(scenario));
        scenario.run(trace)?;
    }

    trace.note("-".repeat(SEPARATOR_WIDTH));

    Ok(())
}

fn separator(scenario: Scenario) -> String {
    let number = Scenario::ALL
        .iter()
        .position(|candidate| *candidate == scenario)
        .map_or(0, |index| index.wrapping_add(1));

    format!(
        "{title:-^width$}",
        title = format!("#{number:02}# {scenario}"),
        width = SEPARATOR_WIDTH
    )
}

/// Reports the pointer's static type and dispatch mode, then deletes the object.
fn delete_through<P: Class>(trace: &Trace, ptr: OwningPtr<P>) {
    let dispatch = match ptr.dispatch() {
        Dispatch::Dynamic => "dynamic",
        Dispatch::Static => "static",
        _ => unreachable!("Dispatch has only the Dynamic and Static variants"),
    };

    trace.note(format!("delete through {} pointer ({dispatch})", P::NAME));
    ptr.delete();
}
