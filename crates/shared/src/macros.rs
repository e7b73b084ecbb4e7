// crates/shared/src/macros.rs

/// Registers the methods of a toolbelt as direct tools.
///
/// Generates a lazily built `INSTANCE`, one `<method>_handler` fn per tool,
/// `TOOL_ENTRIES` (name -> handler) and `TOOL_SCHEMAS`. A parameter tagged
/// `[optional]` is left out of the schema's `required` list.
#[macro_export]
macro_rules! register_toolbelt {
    (@required) => { true };
    (@required optional) => { false };
    (
        $toolbelt_type:ty {
            description: $toolbelt_desc:literal,
            tools: {
                $(
                    $name:literal => $method:ident {
                        description: $desc:literal,
                        params: [$($param_name:literal: $param_type:literal => $param_desc:literal $([$opt:ident])?),* $(,)?]
                    }
                ),* $(,)?
            }
        }
    ) => {
        use once_cell::sync::Lazy;

        pub static INSTANCE: Lazy<$toolbelt_type> = Lazy::new(<$toolbelt_type>::default);

        pub const TOOLBELT: &str = stringify!($toolbelt_type);

        pub const DESCRIPTION: &str = $toolbelt_desc;

        $(
            paste::paste! {
                pub fn [<$method _handler>](args: &serde_json::Value) -> anyhow::Result<String> {
                    INSTANCE.$method(args)
                }
            }
        )*

        paste::paste! {
            pub static TOOL_ENTRIES: &[(&str, $crate::schemas::ToolHandler)] = &[
                $(($name, [<$method _handler>])),*
            ];
        }

        pub static TOOL_SCHEMAS: Lazy<Vec<$crate::schemas::ToolSchema>> = Lazy::new(|| vec![
            $(
                $crate::schemas::ToolSchema {
                    name: $name,
                    toolbelt: stringify!($toolbelt_type),
                    description: $desc,
                    parameters: vec![
                        $(
                            $crate::schemas::ParameterSchema {
                                name: $param_name,
                                type_name: $param_type,
                                description: $param_desc,
                                required: $crate::register_toolbelt!(@required $($opt)?),
                            }
                        ),*
                    ],
                }
            ),*
        ]);
    };
}
