//! Rule table: the registry of RPC classes and their functions.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  RuleTable (MAX_RULES slots, registration order)             │
//! │  ┌──────┬───────────────────────────────────────┬─────────┐  │
//! │  │ slot │ class │ functions (MAX_FUNCTIONS)     │ context │  │
//! │  ├──────┼───────┼───────────────────────────────┼─────────┤  │
//! │  │  0   │ "LED" │ "set"→cb, "on"→cb, "off"→cb   │ &led    │  │
//! │  │  1   │ "SYS" │ "version"→cb                  │ ()      │  │
//! │  │  …   │       │                               │         │  │
//! │  └──────┴───────┴───────────────────────────────┴─────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Registration is append-only: a new class takes the first free slot, a
//! new function is appended to its class. Nothing is reordered or removed,
//! so the [`RuleIndex`] / [`FunctionIndex`] pairs handed out by the matcher
//! stay valid for the table's lifetime. Matching itself lives in
//! [`uri`](super::uri).

use heapless::{String, Vec};
use log::debug;

use super::uri::{self, RouteMatch};
use crate::config::{MAX_CLASS_LEN, MAX_FUNCTIONS, MAX_FUNCTION_LEN, MAX_RESULT_LEN, MAX_RULES};
use crate::error::{RegistrationError, RequestError};

/// Result string produced by a callback.
pub type RpcResult = String<MAX_RESULT_LEN>;

/// Build an [`RpcResult`], truncating `text` at capacity.
pub fn rpc_result(text: &str) -> RpcResult {
    let mut out = RpcResult::new();
    for ch in text.chars() {
        if out.push(ch).is_err() {
            break;
        }
    }
    out
}

/// Application behaviour bound to a class+function pair.
///
/// `context` is the value registered with the class; `argument` is the
/// space-joined argument string (each argument followed by one space).
/// Any `Fn(&C, &str) -> RpcResult` is a callback, so plain functions
/// register directly.
pub trait RpcCallback<C> {
    fn invoke(&self, context: &C, argument: &str) -> RpcResult;
}

impl<C, F> RpcCallback<C> for F
where
    F: Fn(&C, &str) -> RpcResult,
{
    fn invoke(&self, context: &C, argument: &str) -> RpcResult {
        self(context, argument)
    }
}

/// Position of a rule in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RuleIndex(u8);

impl RuleIndex {
    pub const fn get(self) -> usize {
        self.0 as usize
    }
}

/// Position of a function within its rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FunctionIndex(u8);

impl FunctionIndex {
    pub const fn get(self) -> usize {
        self.0 as usize
    }
}

/// One function of a class.
pub struct FunctionEntry<'a, C> {
    name: String<MAX_FUNCTION_LEN>,
    callback: &'a dyn RpcCallback<C>,
}

/// One registered class.
pub struct Rule<'a, C> {
    class: String<MAX_CLASS_LEN>,
    functions: Vec<FunctionEntry<'a, C>, MAX_FUNCTIONS>,
    context: C,
}

impl<'a, C> Rule<'a, C> {
    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn functions(&self) -> &[FunctionEntry<'a, C>] {
        &self.functions
    }
}

/// Fixed-capacity, append-only table of rules.
pub struct RuleTable<'a, C> {
    rules: Vec<Rule<'a, C>, MAX_RULES>,
}

impl<'a, C> RuleTable<'a, C> {
    pub const fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Register `class`/`function` → `callback`.
    ///
    /// If `class` is new it takes the next free slot and keeps `context`;
    /// otherwise the function is appended to the existing class and
    /// `context` is dropped. A failed call leaves the table untouched.
    pub fn add_rule(
        &mut self,
        context: C,
        class: &str,
        function: &str,
        callback: &'a dyn RpcCallback<C>,
    ) -> Result<(), RegistrationError> {
        let class_name = bounded_name::<MAX_CLASS_LEN>(class)?;
        let function_name = bounded_name::<MAX_FUNCTION_LEN>(function)?;
        let entry = FunctionEntry {
            name: function_name,
            callback,
        };

        if let Some(idx) = self.find_class(class) {
            let rule = &mut self.rules[idx.get()];
            if rule.functions.iter().any(|f| f.name == function) {
                return Err(RegistrationError::DuplicateRule);
            }
            rule.functions
                .push(entry)
                .map_err(|_| RegistrationError::FunctionListFull)?;
            debug!(
                "RPC: rule {}/{} added (slot {}, function {})",
                class,
                function,
                idx.get(),
                rule.functions.len() - 1
            );
            return Ok(());
        }

        if self.rules.is_full() {
            return Err(RegistrationError::RuleTableFull);
        }
        let mut functions = Vec::new();
        // A fresh list has room for at least one entry.
        let _ = functions.push(entry);
        let rule = Rule {
            class: class_name,
            functions,
            context,
        };
        if self.rules.push(rule).is_err() {
            return Err(RegistrationError::RuleTableFull);
        }
        debug!(
            "RPC: rule {}/{} added (new slot {})",
            class,
            function,
            self.rules.len() - 1
        );
        Ok(())
    }

    /// Number of occupied class slots.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rule(&self, idx: RuleIndex) -> Option<&Rule<'a, C>> {
        self.rules.get(idx.get())
    }

    pub fn rules(&self) -> impl Iterator<Item = &Rule<'a, C>> {
        self.rules.iter()
    }

    /// First rule whose class equals `class`, in registration order.
    pub fn find_class(&self, class: &str) -> Option<RuleIndex> {
        self.rules
            .iter()
            .position(|r| r.class == class)
            .map(|i| RuleIndex(i as u8))
    }

    /// First function of rule `idx` named `function`.
    pub fn find_function(&self, idx: RuleIndex, function: &str) -> Option<FunctionIndex> {
        self.rule(idx)?
            .functions
            .iter()
            .position(|f| f.name == function)
            .map(|i| FunctionIndex(i as u8))
    }

    /// Every registered `(class, function)` pair in registration order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.rules.iter().flat_map(|r| {
            r.functions
                .iter()
                .map(move |f| (r.class.as_str(), f.name.as_str()))
        })
    }

    /// Match `uri` against the table and fill `args`. See [`uri::resolve`].
    pub fn resolve<const N: usize>(
        &self,
        uri: &str,
        args: &mut String<N>,
    ) -> Result<RouteMatch, RequestError> {
        uri::resolve(self, uri, args)
    }

    /// Run the callback selected by `route` with the rule's context.
    ///
    /// Returns `None` if `route` does not point into this table.
    pub fn invoke(&self, route: RouteMatch, argument: &str) -> Option<RpcResult> {
        let rule = self.rule(route.rule)?;
        let entry = rule.functions.get(route.function.get())?;
        Some(entry.callback.invoke(&rule.context, argument))
    }
}

impl<C> Default for RuleTable<'_, C> {
    fn default() -> Self {
        Self::new()
    }
}

fn bounded_name<const N: usize>(name: &str) -> Result<String<N>, RegistrationError> {
    if name.is_empty() {
        return Err(RegistrationError::EmptyName);
    }
    let mut out = String::new();
    out.push_str(name)
        .map_err(|()| RegistrationError::NameTooLong)?;
    Ok(out)
}
