#[cfg(test)]
mod tests {
    use crate::error::{ERR_DUPLICATE_SCRIPT, ERR_UNTERMINATED_EXPRESSION};
    use crate::parse::{parse_component, ComponentAst, DirectiveKind, MarkupNode, ScriptContext};

    fn describe(ast: &ComponentAst) -> Vec<String> {
        ast.nodes
            .iter()
            .map(|node| match node {
                MarkupNode::Expression(site) => format!("expr:{}", site.text(&ast.source)),
                MarkupNode::Pattern(site) => format!("pattern:{}", site.text(&ast.source)),
                MarkupNode::ConstTag(site) => format!("const:{}", site.text(&ast.source)),
                MarkupNode::Parameters(site) => format!("params:{}", site.text(&ast.source)),
                MarkupNode::Directive(d) => format!("directive:{}", d.name),
                MarkupNode::Script(_) => "script".to_string(),
            })
            .collect()
    }

    fn parse(source: &str) -> ComponentAst {
        parse_component(source, "Test.svelte").unwrap()
    }

    #[test]
    fn test_instance_and_module_scripts() {
        let src = "<script context=\"module\">export const x = 1</script>\n<script lang=\"ts\">let y: number = 2</script>";
        let ast = parse(src);

        let module = ast.module.as_ref().unwrap();
        assert_eq!(module.context, ScriptContext::Module);
        assert_eq!(
            &src[module.content_start..module.content_end],
            "export const x = 1"
        );

        let instance = ast.instance.as_ref().unwrap();
        assert!(instance.typescript);
        assert_eq!(
            &src[instance.content_start..instance.content_end],
            "let y: number = 2"
        );

        assert_eq!(ast.primary_script().unwrap().context, ScriptContext::Module);
        assert_eq!(describe(&ast), vec!["script", "script"]);
    }

    #[test]
    fn test_bare_module_attribute() {
        let ast = parse("<script module>let a</script>");
        assert!(ast.instance.is_none());
        assert!(ast.module.is_some());
    }

    #[test]
    fn test_duplicate_instance_script() {
        let src = "<script>let a</script>\n<script>let b</script>";
        let err = parse_component(src, "Dup.svelte").unwrap_err();
        assert_eq!(err.code, ERR_DUPLICATE_SCRIPT);
        assert_eq!(err.file, "Dup.svelte");
        assert_eq!((err.line, err.column), (2, 1));
    }

    #[test]
    fn test_attributes_and_directives() {
        let ast = parse("<div on:click={onMount} in:fade transition:blur|local use:actions.tip />");
        assert_eq!(
            describe(&ast),
            vec!["expr:onMount", "directive:fade", "directive:blur", "directive:actions"]
        );
    }

    #[test]
    fn test_directive_kinds() {
        let ast = parse("<div out:fly animate:flip use:tooltip on:click={go} bind:value={v} />");
        let kinds: Vec<(DirectiveKind, &str)> = ast
            .nodes
            .iter()
            .filter_map(|node| match node {
                MarkupNode::Directive(d) => Some((d.kind, d.name.as_str())),
                _ => None,
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                (DirectiveKind::Transition, "fly"),
                (DirectiveKind::Animation, "flip"),
                (DirectiveKind::Action, "tooltip"),
            ]
        );
    }

    #[test]
    fn test_quoted_attribute_expressions() {
        let ast = parse(r#"<li animate:flip="{{ delay: 500 }}" class="a {active ? 'on' : 'off'} b">{item}</li>"#);
        assert_eq!(
            describe(&ast),
            vec![
                "directive:flip",
                "expr:{ delay: 500 }",
                "expr:active ? 'on' : 'off'",
                "expr:item",
            ]
        );
    }

    #[test]
    fn test_each_block() {
        let ast = parse("{#each list as item, index (item.id)}<li>{item}</li>{/each}");
        assert_eq!(
            describe(&ast),
            vec![
                "expr:list",
                "pattern:item",
                "pattern:index",
                "expr:item.id",
                "expr:item",
            ]
        );
    }

    #[test]
    fn test_each_block_destructuring() {
        let ast = parse("{#each pairs as [a, b]}{a}{/each}");
        assert_eq!(describe(&ast), vec!["expr:pairs", "pattern:[a, b]", "expr:a"]);
    }

    #[test]
    fn test_block_tags() {
        let src = "{#if ready}{:else if later}{:else}{/if}\
                   {#await load then value}{/await}\
                   {#await fetchIt}{:then data}{:catch error}{/await}\
                   {#key id}{/key}{@html raw}{@const doubled = n * 2}<Comp {...rest} />";
        let ast = parse(src);
        assert_eq!(
            describe(&ast),
            vec![
                "expr:ready",
                "expr:later",
                "expr:load",
                "pattern:value",
                "expr:fetchIt",
                "pattern:data",
                "pattern:error",
                "expr:id",
                "expr:raw",
                "const:const doubled = n * 2",
                "expr:rest",
            ]
        );
    }

    #[test]
    fn test_style_and_comments_are_skipped() {
        let src = "<style>\n  .a { color: red }\n</style>\n<!-- {not code -->\n<p>{x}</p>";
        let ast = parse(src);
        assert_eq!(describe(&ast), vec!["expr:x"]);
        assert_eq!(ast.source.len(), src.len());
    }

    #[test]
    fn test_script_content_is_not_markup() {
        let ast = parse("<script>const o = { a: 1 }</script>\n<p>{o.a}</p>");
        assert_eq!(describe(&ast), vec!["script", "expr:o.a"]);
    }

    #[test]
    fn test_scripts_only_count_at_tag_positions() {
        let src = "<!-- <script>old()</script> -->\n{@html '<script>x</script>'}\n<script>let a</script>";
        let ast = parse(src);

        assert_eq!(describe(&ast), vec!["expr:'<script>x</script>'", "script"]);
        let instance = ast.instance.as_ref().unwrap();
        assert_eq!(&src[instance.content_start..instance.content_end], "let a");
        assert!(ast.module.is_none());
    }

    #[test]
    fn test_self_closing_and_component_script_tags() {
        let src = "<script src=\"a.js\" />\n<Script>{x}</Script>\n<script>let a</script>";
        let ast = parse(src);

        assert_eq!(describe(&ast), vec!["expr:x", "script"]);
        let instance = ast.instance.as_ref().unwrap();
        assert_eq!(&src[instance.content_start..instance.content_end], "let a");
    }

    #[test]
    fn test_snippet_and_slot_bindings() {
        let ast = parse("{#snippet row(fade, { id })}<p>{fade}</p>{/snippet}<List let:item={fly} let:index>{fly}</List>");
        assert_eq!(
            describe(&ast),
            vec![
                "pattern:row",
                "params:fade, { id }",
                "expr:fade",
                "pattern:fly",
                "pattern:index",
                "expr:fly",
            ]
        );
    }

    #[test]
    fn test_unterminated_expression() {
        let err = parse_component("<p>\n  {count</p>", "Broken.svelte").unwrap_err();
        assert_eq!(err.code, ERR_UNTERMINATED_EXPRESSION);
        assert_eq!((err.line, err.column), (2, 3));
    }
}
