use super::{MethodId, ScriptRuntime};

/// The lifecycle methods the driver calls.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HookKind {
    Entry,
    Update,
    Render,
    Destroy,
}

impl HookKind {
    pub const ALL: [HookKind; 4] = [Self::Entry, Self::Update, Self::Render, Self::Destroy];

    pub const fn method_name(self) -> &'static str {
        match self {
            Self::Entry => "Entry",
            Self::Update => "Update",
            Self::Render => "Render",
            Self::Destroy => "Destroy",
        }
    }
}

/// Hook methods resolved once after the assembly loads. Any of them may be missing.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Hooks {
    pub entry: Option<MethodId>,
    pub update: Option<MethodId>,
    pub render: Option<MethodId>,
    pub destroy: Option<MethodId>,
}

impl Hooks {
    pub fn resolve(runtime: &mut dyn ScriptRuntime, class: &str) -> Self {
        let mut hooks = Hooks::default();
        for kind in HookKind::ALL {
            let name = format!("{class}:{}", kind.method_name());
            let id = runtime.resolve(&name);
            if id.is_none() {
                log::debug!("hook {name} not found; skipping");
            }
            *hooks.slot_mut(kind) = id;
        }
        hooks
    }

    pub fn get(&self, kind: HookKind) -> Option<MethodId> {
        match kind {
            HookKind::Entry => self.entry,
            HookKind::Update => self.update,
            HookKind::Render => self.render,
            HookKind::Destroy => self.destroy,
        }
    }

    fn slot_mut(&mut self, kind: HookKind) -> &mut Option<MethodId> {
        match kind {
            HookKind::Entry => &mut self.entry,
            HookKind::Update => &mut self.update,
            HookKind::Render => &mut self.render,
            HookKind::Destroy => &mut self.destroy,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::bridge::InternalCallTable;
    use crate::engine::SharedEngine;
    use crate::script::{ScriptError, Value};

    /// Knows only the methods it was built with.
    struct Names(Vec<&'static str>);

    impl ScriptRuntime for Names {
        fn load_assembly(&mut self, _path: &Path) -> Result<(), ScriptError> {
            Ok(())
        }

        fn register_internal_calls(
            &mut self,
            _namespace: &str,
            _calls: &InternalCallTable,
            _engine: SharedEngine,
        ) -> Result<(), ScriptError> {
            Ok(())
        }

        fn resolve(&mut self, name: &str) -> Option<MethodId> {
            self.0.iter().position(|n| *n == name).map(|i| MethodId(i as u32))
        }

        fn invoke(&mut self, _method: MethodId, _args: &[Value]) -> Result<Value, ScriptError> {
            Ok(Value::Nil)
        }

        fn shutdown(&mut self) {}
    }

    #[test]
    fn missing_hooks_are_none() {
        let mut rt = Names(vec!["Game.Main:Update", "Game.Main:Render"]);
        let hooks = Hooks::resolve(&mut rt, "Game.Main");
        assert_eq!(hooks.entry, None);
        assert_eq!(hooks.update, Some(MethodId(0)));
        assert_eq!(hooks.render, Some(MethodId(1)));
        assert_eq!(hooks.get(HookKind::Destroy), None);
    }

    #[test]
    fn class_name_is_part_of_the_lookup() {
        let mut rt = Names(vec!["Other:Entry"]);
        assert_eq!(Hooks::resolve(&mut rt, "Game.Main"), Hooks::default());
    }
}
