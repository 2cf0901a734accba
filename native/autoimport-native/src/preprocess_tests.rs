#[cfg(test)]
mod tests {
    use crate::config::{ConfigInput, PreprocessorOptions};
    use crate::error::{ERR_DUPLICATE_SCRIPT, ERR_SCRIPT_SYNTAX};
    use crate::preprocess::{MarkupInput, Preprocessor};
    use proptest::prelude::*;

    const FILENAME: &str = "/projects/foo/src/Test.svelte";

    /// Strip surrounding blank lines and the common indentation.
    fn dedent(text: &str) -> String {
        let lines: Vec<&str> = text.lines().collect();
        let first = lines.iter().position(|l| !l.trim().is_empty());
        let last = lines.iter().rposition(|l| !l.trim().is_empty());
        let (Some(first), Some(last)) = (first, last) else {
            return String::new();
        };
        let lines = &lines[first..=last];
        let indent = lines
            .iter()
            .filter(|l| !l.trim().is_empty())
            .map(|l| l.len() - l.trim_start().len())
            .min()
            .unwrap_or(0);
        lines
            .iter()
            .map(|l| if l.trim().is_empty() { "" } else { &l[indent..] })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn run(preprocessor: &Preprocessor, source: &str) -> String {
        preprocessor
            .markup(&MarkupInput::new(&dedent(source), FILENAME))
            .unwrap()
            .code
    }

    fn check(source: &str, expected: &str) {
        assert_eq!(run(&Preprocessor::default(), source), dedent(expected));
    }

    fn check_with(options: &str, source: &str, expected: &str) {
        let options = PreprocessorOptions::from_json(options).unwrap();
        let preprocessor = Preprocessor::new(ConfigInput::Options(options));
        assert_eq!(run(&preprocessor, source), dedent(expected));
    }

    fn unchanged(source: &str) {
        check(source, source);
    }

    #[test]
    fn test_nothing_to_do() {
        unchanged("Hello");
        let out = Preprocessor::default()
            .markup(&MarkupInput::new("Hello\n", FILENAME))
            .unwrap();
        assert_eq!(out.code, "Hello\n");
        assert_eq!(out.map, None);
    }

    #[test]
    fn test_markup_only_appends_script() {
        check(
            r#"
            <div on:click={onMount} />
            "#,
            r#"
            <div on:click={onMount} />
            <script>import { onMount } from 'svelte';</script>
            "#,
        );
    }

    #[test]
    fn test_inserts_into_existing_script() {
        check(
            r#"
            <script>
              onMount(() => {
                console.log('hello')
              })
            </script>
            "#,
            r#"
            <script>import { onMount } from 'svelte';
              onMount(() => {
                console.log('hello')
              })
            </script>
            "#,
        );
    }

    #[test]
    fn test_groups_named_imports() {
        check(
            r#"
            <script>
              onMount(() => {
                console.log('hello')
              })
              onDestroy(() => {
                console.log('bye')
              })
            </script>
            "#,
            r#"
            <script>import { onDestroy, onMount } from 'svelte';
              onMount(() => {
                console.log('hello')
              })
              onDestroy(() => {
                console.log('bye')
              })
            </script>
            "#,
        );
    }

    #[test]
    fn test_local_bindings_are_not_imported() {
        unchanged(
            r#"
            <script>
              let onMount = () => {}
              onMount(() => {
                console.log('hello')
              })
            </script>
            "#,
        );
        unchanged(
            r#"
            <script>
              const onMount = () => {}
              onMount(() => {
                console.log('hello')
              })
            </script>
            "#,
        );
    }

    #[test]
    fn test_existing_imports_are_respected() {
        for import in [
            "import { onMount } from 'foo'",
            "import { onMount } from 'svelte'",
            "import { whatever as onMount } from 'foo'",
            "import onMount from 'foo'",
        ] {
            let source = format!(
                "<script>\n  {}\n  onMount(() => {{\n    console.log('hello')\n  }})\n</script>",
                import
            );
            unchanged(&source);
        }
    }

    #[test]
    fn test_aliased_import_does_not_bind_export_name() {
        check(
            r#"
            <script>
              import { onMount as xxx } from 'foo'
              onMount(() => {
                console.log('hello')
              })
            </script>
            "#,
            r#"
            <script>import { onMount } from 'svelte';
              import { onMount as xxx } from 'foo'
              onMount(() => {
                console.log('hello')
              })
            </script>
            "#,
        );
    }

    #[test]
    fn test_custom_alias() {
        check_with(
            r#"{ "aliases": { "useEffect": { "import": "onMount", "from": "svelte" } } }"#,
            r#"
            <script>
              useEffect(() => {
                console.log('hello')
              })
              onMount(() => {})
            </script>
            "#,
            r#"
            <script>import { onMount as useEffect } from 'svelte';
              useEffect(() => {
                console.log('hello')
              })
              onMount(() => {})
            </script>
            "#,
        );
    }

    #[test]
    fn test_same_export_under_two_aliases() {
        check_with(
            r#"{ "aliases": { "onMount": "svelte", "useEffect": { "import": "onMount", "from": "svelte" } } }"#,
            r#"
            <script>
              useEffect(() => {
                console.log('hello')
              })
              onMount(() => {
                console.log('ola')
              })
            </script>
            "#,
            r#"
            <script>import { onMount, onMount as useEffect } from 'svelte';
              useEffect(() => {
                console.log('hello')
              })
              onMount(() => {
                console.log('ola')
              })
            </script>
            "#,
        );
    }

    #[test]
    fn test_function_config() {
        let preprocessor = Preprocessor::new(ConfigInput::Function(Box::new(|defaults| {
            let mut table = defaults.clone();
            table.remove("tick");
            table
        })));
        assert_eq!(
            run(&preprocessor, "<p>{tick}{fade}</p>"),
            "<p>{tick}{fade}</p>\n<script>import { fade } from 'svelte/transition';</script>"
        );
    }

    #[test]
    fn test_module_script() {
        check(
            r#"
            <script context="module">
              onMount(() => {
                console.log('hello')
              })
            </script>
            "#,
            r#"
            <script context="module">import { onMount } from 'svelte';
              onMount(() => {
                console.log('hello')
              })
            </script>
            "#,
        );
    }

    #[test]
    fn test_module_script_preferred_over_instance() {
        check(
            r#"
            <script>
              onMount(() => {
                console.log('hello')
              })
            </script>
            <script context="module">
              // placeholder
            </script>
            "#,
            r#"
            <script>
              onMount(() => {
                console.log('hello')
              })
            </script>
            <script context="module">import { onMount } from 'svelte';
              // placeholder
            </script>
            "#,
        );
    }

    #[test]
    fn test_dispatch_from_script() {
        check_with(
            r#"{ "createEventDispatcher": "$$dispatch" }"#,
            r#"
            <script>
              $$dispatch('bim', { name: 'rixo' })
            </script>
            "#,
            r#"
            <script>import { createEventDispatcher as ___spài_createEventDispatcher } from 'svelte'; const __dispatch = ___spài_createEventDispatcher();
              __dispatch('bim', { name: 'rixo' })
            </script>
            "#,
        );
    }

    #[test]
    fn test_dispatch_from_markup() {
        check_with(
            r#"{ "createEventDispatcher": "$$dispatch" }"#,
            r#"
            <button on:click={() => $$dispatch('bim', { name: 'rixo' })} />
            "#,
            r#"
            <button on:click={() => __dispatch('bim', { name: 'rixo' })} />
            <script>import { createEventDispatcher as ___spài_createEventDispatcher } from 'svelte'; const __dispatch = ___spài_createEventDispatcher();</script>
            "#,
        );
    }

    #[test]
    fn test_dispatch_next_to_existing_dispatcher() {
        check_with(
            r#"{ "createEventDispatcher": "$$dispatch" }"#,
            r#"
            <script>
              import { createEventDispatcher } from 'svelte'

              const dispatch = createEventDispatcher()

              $$dispatch('bim', { name: 'rixo' })
            </script>
            "#,
            r#"
            <script>import { createEventDispatcher as ___spài_createEventDispatcher } from 'svelte'; const __dispatch = ___spài_createEventDispatcher();
              import { createEventDispatcher } from 'svelte'

              const dispatch = createEventDispatcher()

              __dispatch('bim', { name: 'rixo' })
            </script>
            "#,
        );
    }

    #[test]
    fn test_existing_dispatch_is_left_alone() {
        let source = r#"
            <script>
              import { createEventDispatcher } from 'svelte'

              const dispatch = createEventDispatcher()

              dispatch('bim', { name: 'rixo' })
            </script>
            "#;
        check_with(r#"{ "createEventDispatcher": "dispatch" }"#, source, source);
    }

    #[test]
    fn test_dispatch_disabled() {
        let source = "<button on:click={() => $$dispatch('x')} />";
        check_with(r#"{ "createEventDispatcher": false }"#, source, source);
    }

    #[test]
    fn test_scss_style_is_untouched() {
        check(
            r#"
            <style lang="scss">
              $red: red;
              div { color: $red }
            </style>
            <div on:click={onMount} />
            "#,
            r#"
            <style lang="scss">
              $red: red;
              div { color: $red }
            </style>
            <div on:click={onMount} />
            <script>import { onMount } from 'svelte';</script>
            "#,
        );
    }

    #[test]
    fn test_transitions() {
        check(
            "<div in:fade />",
            "<div in:fade />\n<script>import { fade } from 'svelte/transition';</script>",
        );
        check(
            "<div out:fly={{ y: 200, duration: 2000 }} />",
            "<div out:fly={{ y: 200, duration: 2000 }} />\n<script>import { fly } from 'svelte/transition';</script>",
        );
        check(
            "<div transition:blur|local />",
            "<div transition:blur|local />\n<script>import { blur } from 'svelte/transition';</script>",
        );
    }

    #[test]
    fn test_animations() {
        for li in [
            "<li animate:flip>{item}</li>",
            r#"<li animate:flip="{{ delay: 500 }}">{item}</li>"#,
        ] {
            let source = format!("{{#each list as item, index (item)}}\n  {}\n{{/each}}", li);
            check(
                &source,
                &format!("{}\n<script>import {{ flip }} from 'svelte/animate';</script>", source),
            );
        }
    }

    #[test]
    fn test_multiple_modules_keep_first_use_order() {
        check(
            "<div in:fade>{$count}</div>\n<script>\n  const count = writable(0)\n  onMount(tick)\n</script>",
            "<div in:fade>{$count}</div>\n<script>import { fade } from 'svelte/transition'; import { writable } from 'svelte/store'; import { onMount, tick } from 'svelte';\n  const count = writable(0)\n  onMount(tick)\n</script>",
        );
    }

    #[test]
    fn test_commented_out_script_is_not_a_duplicate() {
        check(
            "<!-- <script>old()</script> -->\n<script>\n  onMount(() => {})\n</script>",
            "<!-- <script>old()</script> -->\n<script>import { onMount } from 'svelte';\n  onMount(() => {})\n</script>",
        );
    }

    #[test]
    fn test_commented_out_script_is_not_a_target() {
        check(
            "<!-- <script></script> -->\n<div on:click={onMount} />",
            "<!-- <script></script> -->\n<div on:click={onMount} />\n<script>import { onMount } from 'svelte';</script>",
        );
    }

    #[test]
    fn test_script_inside_string_is_not_a_target() {
        check(
            "{@html '<script>x</script>'}\n<div on:click={onMount} />",
            "{@html '<script>x</script>'}\n<div on:click={onMount} />\n<script>import { onMount } from 'svelte';</script>",
        );
    }

    #[test]
    fn test_snippet_parameters_and_slot_bindings_are_local() {
        unchanged("{#snippet row(fade)}<p>{fade}</p>{/snippet}\n<List let:item={fly}>{fly}</List>\n<List let:blur>{blur}</List>");
    }

    #[test]
    fn test_errors_are_reported() {
        let preprocessor = Preprocessor::default();

        let err = preprocessor
            .markup(&MarkupInput::new("<script>\n  let = ;\n</script>", "Bad.svelte"))
            .unwrap_err();
        assert_eq!(err.code, ERR_SCRIPT_SYNTAX);
        assert_eq!(err.file, "Bad.svelte");

        let err = preprocessor
            .markup(&MarkupInput::new("<script></script><script></script>", "Dup.svelte"))
            .unwrap_err();
        assert_eq!(err.code, ERR_DUPLICATE_SCRIPT);
    }

    #[test]
    fn test_markup_many_keeps_input_order() {
        let inputs = vec![
            MarkupInput::new("<p>{tick}</p>", "A.svelte"),
            MarkupInput::new("<p>{a +}</p>", "B.svelte"),
            MarkupInput::new("Hello", "C.svelte"),
        ];
        let results = Preprocessor::default().markup_many(&inputs);

        assert_eq!(results.len(), 3);
        assert_eq!(
            results[0].as_ref().unwrap().code,
            "<p>{tick}</p>\n<script>import { tick } from 'svelte';</script>"
        );
        assert_eq!(results[1].as_ref().unwrap_err().file, "B.svelte");
        assert_eq!(results[2].as_ref().unwrap().code, "Hello");
    }

    proptest! {
        #[test]
        fn prop_plain_text_is_untouched(text in "[a-zA-Z .,\n]{0,80}") {
            let out = Preprocessor::default()
                .markup(&MarkupInput::new(&text, FILENAME))
                .unwrap();
            prop_assert_eq!(out.code, text);
        }

        #[test]
        fn prop_clause_order_ignores_use_order(
            names in prop::sample::subsequence(
                vec!["afterUpdate", "beforeUpdate", "onDestroy", "onMount", "tick"],
                1..=5,
            ).prop_shuffle()
        ) {
            let body: String = names.iter().map(|n| format!("\n  {}();", n)).collect();
            let source = format!("<script>{}\n</script>", body);

            let mut sorted = names.clone();
            sorted.sort();
            let expected = format!(
                "<script>import {{ {} }} from 'svelte';{}\n</script>",
                sorted.join(", "),
                body
            );

            let preprocessor = Preprocessor::default();
            let first = preprocessor.markup(&MarkupInput::new(&source, FILENAME)).unwrap();
            let second = preprocessor.markup(&MarkupInput::new(&source, FILENAME)).unwrap();
            prop_assert_eq!(&first.code, &expected);
            prop_assert_eq!(first, second);
        }
    }
}
