/// Assert that a list of components has exactly the given gids, in order
#[macro_export]
macro_rules! assert_gids {
    ($components:expr, [$($gid:expr),* $(,)?]) => {
        let expected: Vec<String> = vec![$($gid.to_string()),*];
        assert_eq!(
            $crate::helpers::gids(&$components),
            expected,
            "Component gids do not match"
        );
    };
}

/// Assert that two component handles are the same instance
#[macro_export]
macro_rules! assert_same_component {
    ($left:expr, $right:expr) => {
        assert!(
            std::rc::Rc::ptr_eq(&$left, &$right),
            "Expected the same component instance"
        );
    };
}

/// Assert that a component is destroyed and no longer registered
#[macro_export]
macro_rules! assert_destroyed {
    ($factory:expr, $component:expr) => {
        let component = parallax_shared::ComponentType::upcast($component.clone());
        assert!(
            component.core().is_destroyed(),
            "Component {:?} should be destroyed",
            component
        );
        assert!(
            !$factory.registry().contains(component.gid()),
            "Component {:?} should not be registered",
            component
        );
    };
}
