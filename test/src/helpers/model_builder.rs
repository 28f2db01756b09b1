use parallax_shared::{Collection, Model, ModelFactory, SyncError};

use crate::test_models::FOO;

/// Fluent builder for Foo model trees
pub struct FooBuilder {
    gid: String,
    name: Option<String>,
    foo: Option<Model>,
    bar: Option<Model>,
    children: Vec<Model>,
    refs: Vec<Model>,
}

impl FooBuilder {
    pub fn new(gid: &str) -> Self {
        Self {
            gid: gid.to_string(),
            name: None,
            foo: None,
            bar: None,
            children: Vec::new(),
            refs: Vec::new(),
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Owned single child
    pub fn foo(mut self, child: &Model) -> Self {
        self.foo = Some(child.clone());
        self
    }

    /// Referenced single node
    pub fn bar(mut self, target: &Model) -> Self {
        self.bar = Some(target.clone());
        self
    }

    pub fn child(mut self, child: &Model) -> Self {
        self.children.push(child.clone());
        self
    }

    pub fn reference(mut self, target: &Model) -> Self {
        self.refs.push(target.clone());
        self
    }

    pub fn build(self, models: &ModelFactory) -> Result<Model, SyncError> {
        let model = models.create_with_gid(FOO, self.gid.as_str())?;
        if let Some(name) = self.name {
            model.set("name", name)?;
        }
        if let Some(foo) = self.foo {
            model.set("foo", foo)?;
        }
        if let Some(bar) = self.bar {
            model.set("bar", bar)?;
        }
        let children = model.collection("children")?;
        for child in self.children {
            children.add(child)?;
        }
        if !self.refs.is_empty() {
            model.set("refs", Collection::with_items(self.refs))?;
        }
        Ok(model)
    }
}
