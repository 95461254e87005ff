use std::{cell::RefCell, collections::HashMap, fmt::Debug, rc::Rc};

use crate::{
    ast::Statement,
    interpreter::{
        context::{Context, shared::Shared, symbol::SymbolTable},
        value::types::Type,
    },
};

/// A declared parameter: its name, slot in the function's symbol table and
/// type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    /// Lower-case parameter name.
    pub name: String,
    /// Slot in the function's private symbol table.
    pub slot: usize,
    /// Declared type.
    pub ty:   Type,
}

/// A user function.
///
/// Declared as a placeholder before its body is parsed so the body may call
/// it, then defined with the body and its private symbol table. Call
/// environments are pooled: [`Functor::acquire`] pops one (or builds a new
/// one from the symbol table), [`Functor::release`] resets it to typed nulls
/// and pushes it back.
pub struct Functor {
    name:     String,
    params:   Vec<Param>,
    ret:      Option<Type>,
    body:     RefCell<Option<Rc<Vec<Statement>>>>,
    template: RefCell<SymbolTable>,
    pool:     RefCell<Vec<Context>>,
}

impl Debug for Functor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Functor")
         .field("name", &self.name)
         .field("params", &self.params)
         .field("ret", &self.ret)
         .field("pooled", &self.pool.borrow().len())
         .finish_non_exhaustive()
    }
}

impl Functor {
    /// The function name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared parameters, in order.
    #[must_use]
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// The declared result type; `None` for a procedure.
    #[must_use]
    pub const fn ret(&self) -> Option<Type> {
        self.ret
    }

    /// The body, once defined.
    #[must_use]
    pub fn body(&self) -> Option<Rc<Vec<Statement>>> {
        self.body.borrow().clone()
    }

    /// Completes a placeholder with its body and symbol table.
    pub fn define(&self, body: Rc<Vec<Statement>>, template: SymbolTable) {
        *self.body.borrow_mut() = Some(body);
        *self.template.borrow_mut() = template;
        self.pool.borrow_mut().clear();
    }

    /// Takes a call environment from the pool, building one when the pool is
    /// empty.
    #[must_use]
    pub fn acquire(&self, shared: &Rc<Shared>) -> Context {
        if let Some(env) = self.pool.borrow_mut().pop() {
            return env;
        }
        tracing::trace!(function = %self.name, "building call environment");
        Context::environment(shared, self.template.borrow().clone())
    }

    /// Resets a call environment and returns it to the pool.
    pub fn release(&self, mut env: Context) {
        env.reset_environment();
        self.pool.borrow_mut().push(env);
    }

    /// Number of pooled environments.
    #[must_use]
    pub fn pooled(&self) -> usize {
        self.pool.borrow().len()
    }

    fn purge(&self) {
        self.pool.borrow_mut().clear();
        self.body.borrow_mut().take();
    }
}

/// A declaration made during the current parse attempt, with the function it
/// displaced.
#[derive(Debug)]
struct Declaration {
    name:      String,
    declared:  Rc<Functor>,
    displaced: Option<Rc<Functor>>,
}

/// The registry of user functions shared by a root context and all contexts
/// derived from it.
///
/// Declarations are journaled like symbol registrations: a failed top-level
/// parse rolls back every function it declared and restores the ones they
/// replaced.
#[derive(Debug, Default)]
pub struct FunctorManager {
    functors: RefCell<HashMap<String, Rc<Functor>>>,
    journal:  RefCell<Vec<Declaration>>,
}

impl FunctorManager {
    /// Creates an empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a placeholder for `name`, replacing any previous
    /// declaration. Calls parsed earlier keep the function they resolved to.
    pub fn declare(&self, name: &str, params: Vec<Param>, ret: Option<Type>) -> Rc<Functor> {
        tracing::debug!(function = name, params = params.len(), "declaring function");
        let functor = Rc::new(Functor { name: name.to_string(),
                                        params,
                                        ret,
                                        body: RefCell::new(None),
                                        template: RefCell::new(SymbolTable::new()),
                                        pool: RefCell::new(Vec::new()) });
        let displaced = self.functors
                            .borrow_mut()
                            .insert(name.to_string(), Rc::clone(&functor));
        self.journal.borrow_mut().push(Declaration { name: name.to_string(),
                                                     declared: Rc::clone(&functor),
                                                     displaced });
        functor
    }

    /// Withdraws a placeholder whose body failed to parse, putting back the
    /// function it replaced.
    pub fn withdraw(&self, functor: &Rc<Functor>) {
        let position = self.journal
                           .borrow()
                           .iter()
                           .rposition(|d| Rc::ptr_eq(&d.declared, functor));
        if let Some(position) = position {
            let declaration = self.journal.borrow_mut().remove(position);
            self.undo(declaration);
        }
    }

    /// Starts journaling declarations for a parse attempt.
    pub fn begin_attempt(&self) {
        self.journal.borrow_mut().clear();
    }

    /// Keeps the declarations of the current attempt.
    pub fn commit(&self) {
        self.journal.borrow_mut().clear();
    }

    /// Undoes the declarations of the current attempt, newest first.
    pub fn rollback(&self) {
        let journal = std::mem::take(&mut *self.journal.borrow_mut());
        for declaration in journal.into_iter().rev() {
            self.undo(declaration);
        }
    }

    fn undo(&self, declaration: Declaration) {
        let Declaration { name,
                          declared,
                          displaced, } = declaration;
        let mut functors = self.functors.borrow_mut();
        if !functors.get(&name).is_some_and(|f| Rc::ptr_eq(f, &declared)) {
            return;
        }
        tracing::debug!(function = %name, restored = displaced.is_some(), "rolling back function declaration");
        match displaced {
            Some(previous) => functors.insert(name, previous),
            None => functors.remove(&name),
        };
    }

    /// Finds a function by name.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<Rc<Functor>> {
        self.functors.borrow().get(name).cloned()
    }

    /// Number of declared functions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.functors.borrow().len()
    }

    /// `true` if no function is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.functors.borrow().is_empty()
    }

    /// Drops every declaration, body and pooled environment.
    pub fn purge(&self) {
        self.journal.borrow_mut().clear();
        let drained: Vec<Rc<Functor>> = self.functors.borrow_mut().drain().map(|(_, f)| f).collect();
        for functor in drained {
            functor.purge();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn withdrawn_redeclaration_restores_the_previous_function() {
        let functors = FunctorManager::new();
        let first = functors.declare("f", Vec::new(), Some(Type::INTEGER));
        functors.commit();

        let second = functors.declare("f", Vec::new(), Some(Type::LITERAL));
        assert!(functors.lookup("f").is_some_and(|f| Rc::ptr_eq(&f, &second)));

        functors.withdraw(&second);
        assert!(functors.lookup("f").is_some_and(|f| Rc::ptr_eq(&f, &first)));
    }

    #[test]
    fn rollback_undoes_only_the_current_attempt() {
        let functors = FunctorManager::new();
        let kept = functors.declare("kept", Vec::new(), None);
        functors.commit();

        functors.begin_attempt();
        functors.declare("fresh", Vec::new(), None);
        functors.declare("kept", Vec::new(), None);
        functors.rollback();

        assert!(functors.lookup("fresh").is_none());
        assert!(functors.lookup("kept").is_some_and(|f| Rc::ptr_eq(&f, &kept)));
        assert_eq!(functors.len(), 1);
    }
}
