use crate::error::CompilerError;
use crate::parse::{CodeSite, ComponentAst, DirectiveSite, MarkupNode, ScriptBlock};

/// The MarkupVisitor trait defines the single authoritative traversal mechanism for
/// a parsed component.
///
/// Rules:
/// 1. Nodes are visited in document order.
/// 2. Implementers override `visit_*` methods to add behavior.
/// 3. Implementers MUST call `walk_*` functions to continue traversal unless pruning is intended.
/// 4. The first error stops the traversal.
pub trait MarkupVisitor {
    fn visit_component(&mut self, component: &ComponentAst) -> Result<(), CompilerError> {
        walk_component(self, component)
    }

    fn visit_node(&mut self, node: &MarkupNode) -> Result<(), CompilerError> {
        walk_node(self, node)
    }

    fn visit_expression(&mut self, _site: &CodeSite) -> Result<(), CompilerError> {
        Ok(())
    }

    fn visit_pattern(&mut self, _site: &CodeSite) -> Result<(), CompilerError> {
        Ok(())
    }

    fn visit_const_tag(&mut self, _site: &CodeSite) -> Result<(), CompilerError> {
        Ok(())
    }

    fn visit_parameters(&mut self, _site: &CodeSite) -> Result<(), CompilerError> {
        Ok(())
    }

    fn visit_directive(&mut self, _directive: &DirectiveSite) -> Result<(), CompilerError> {
        Ok(())
    }

    fn visit_script(&mut self, _script: &ScriptBlock) -> Result<(), CompilerError> {
        Ok(())
    }
}

pub fn walk_component<V: MarkupVisitor + ?Sized>(
    visitor: &mut V,
    component: &ComponentAst,
) -> Result<(), CompilerError> {
    for node in &component.nodes {
        visitor.visit_node(node)?;
    }
    Ok(())
}

pub fn walk_node<V: MarkupVisitor + ?Sized>(
    visitor: &mut V,
    node: &MarkupNode,
) -> Result<(), CompilerError> {
    match node {
        MarkupNode::Expression(site) => visitor.visit_expression(site),
        MarkupNode::Pattern(site) => visitor.visit_pattern(site),
        MarkupNode::ConstTag(site) => visitor.visit_const_tag(site),
        MarkupNode::Parameters(site) => visitor.visit_parameters(site),
        MarkupNode::Directive(directive) => visitor.visit_directive(directive),
        MarkupNode::Script(script) => visitor.visit_script(script),
    }
}
