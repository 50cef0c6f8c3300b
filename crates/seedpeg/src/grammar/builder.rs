//! Grammar builder.
//!
//! Rules are declared first and defined later, so closure bodies can capture
//! the ids of rules that are defined after them (mutual recursion).

use super::{Grammar, RuleBody, RuleDef, RuleId, RuleNames};
use crate::error::{GrammarError, ParseError};
use crate::packrat::{Outcome, Session};
use compact_str::CompactString;

/// Adapter turning a closure into a [`RuleBody`].
///
/// Usually created through [`GrammarBuilder::rule_fn`] or
/// [`GrammarBuilder::define_fn`], which pin down the closure signature.
pub struct FnBody<F>(pub F);

impl<S, V, F> RuleBody<S, V> for FnBody<F>
where
    F: Fn(&mut Session<'_, S, V>) -> Result<Outcome<V>, ParseError> + Send + Sync,
{
    fn evaluate(&self, session: &mut Session<'_, S, V>) -> Result<Outcome<V>, ParseError> {
        (self.0)(session)
    }
}

/// Builder for [`Grammar`].
pub struct GrammarBuilder<S, V> {
    names: RuleNames,
    declared: Vec<CompactString>,
    bodies: Vec<Option<Box<dyn RuleBody<S, V>>>>,
    duplicate: Option<CompactString>,
}

impl<S, V> Default for GrammarBuilder<S, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, V> GrammarBuilder<S, V> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            names: RuleNames::default(),
            declared: Vec::new(),
            bodies: Vec::new(),
            duplicate: None,
        }
    }

    /// Declare a rule without a body. Declaring a name twice is reported by
    /// [`build`](Self::build); the second call returns the existing id.
    pub fn declare(&mut self, name: &str) -> RuleId {
        if let Some(id) = self.names.get(name) {
            self.duplicate.get_or_insert_with(|| CompactString::from(name));
            return id;
        }
        let id = RuleId::new(self.declared.len() as u32);
        self.names.insert(CompactString::from(name), id);
        self.declared.push(CompactString::from(name));
        self.bodies.push(None);
        id
    }

    /// Attach a body to a declared rule, replacing any previous body.
    pub fn define<B>(&mut self, rule: RuleId, body: B) -> &mut Self
    where
        B: RuleBody<S, V> + 'static,
    {
        if let Some(slot) = self.bodies.get_mut(rule.index()) {
            *slot = Some(Box::new(body));
        }
        self
    }

    /// Attach a closure body to a declared rule.
    pub fn define_fn<F>(&mut self, rule: RuleId, body: F) -> &mut Self
    where
        F: Fn(&mut Session<'_, S, V>) -> Result<Outcome<V>, ParseError> + Send + Sync + 'static,
    {
        self.define(rule, FnBody(body))
    }

    /// Declare and define a rule in one step.
    pub fn rule<B>(&mut self, name: &str, body: B) -> RuleId
    where
        B: RuleBody<S, V> + 'static,
    {
        let id = self.declare(name);
        self.define(id, body);
        id
    }

    /// Declare and define a rule with a closure body.
    pub fn rule_fn<F>(&mut self, name: &str, body: F) -> RuleId
    where
        F: Fn(&mut Session<'_, S, V>) -> Result<Outcome<V>, ParseError> + Send + Sync + 'static,
    {
        let id = self.declare(name);
        self.define_fn(id, body);
        id
    }

    /// Look up a declared rule.
    #[must_use]
    pub fn rule_id(&self, name: &str) -> Option<RuleId> {
        self.names.get(name)
    }

    /// Resolve every body's references and freeze the rule table.
    ///
    /// # Errors
    ///
    /// Fails on an empty grammar, a duplicated declaration, a declared rule
    /// without a body, or a reference to an undeclared rule.
    pub fn build(self) -> Result<Grammar<S, V>, GrammarError> {
        if let Some(name) = self.duplicate {
            return Err(GrammarError::DuplicateRule(name));
        }
        if self.declared.is_empty() {
            return Err(GrammarError::EmptyGrammar);
        }

        let mut rules = Vec::with_capacity(self.declared.len());
        for (name, body) in self.declared.into_iter().zip(self.bodies) {
            let Some(mut body) = body else {
                return Err(GrammarError::MissingBody(name));
            };
            body.resolve(&self.names, &name)?;
            rules.push(RuleDef { name, body });
        }

        Ok(Grammar {
            rules,
            names: self.names,
        })
    }
}
