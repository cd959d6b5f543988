use anyhow::{Context, Result};
use clap::Subcommand;
use stratboard_core::{Catalog, Framework, FrameworkCategory, FrameworkSection};

#[derive(Subcommand, Debug)]
pub enum FrameworksCommand {
    /// List the built-in frameworks
    List {
        /// Only show one category (general or case-specific)
        #[arg(long)]
        category: Option<FrameworkCategory>,
        /// Case-insensitive search on name and description
        #[arg(long)]
        search: Option<String>,
    },
    /// Show a framework's sections and guiding questions
    Show { id: String },
}

pub fn run(command: &FrameworksCommand) -> Result<()> {
    let catalog = Catalog::builtin();
    match command {
        FrameworksCommand::List { category, search } => {
            let mut frameworks: Vec<&Framework> = match search {
                Some(query) => catalog.search(query),
                None => catalog.all().iter().collect(),
            };
            if let Some(category) = category {
                frameworks.retain(|f| f.category == *category);
            }
            for framework in frameworks {
                println!(
                    "{:<18} {:<32} {}",
                    framework.id,
                    framework.name,
                    framework.category.label()
                );
            }
            Ok(())
        }
        FrameworksCommand::Show { id } => {
            let framework = catalog
                .get(id)
                .with_context(|| format!("unknown framework '{}'", id))?;
            print!("{}", describe(framework));
            Ok(())
        }
    }
}

fn describe(framework: &Framework) -> String {
    let mut out = format!(
        "{} ({})\nCategory: {}\nDiagram: {}\n\n{}\n",
        framework.name,
        framework.id,
        framework.category.label(),
        framework.diagram().label(),
        framework.description,
    );
    if !framework.use_case.is_empty() {
        out.push_str(&format!("\nUse case: {}\n", framework.use_case));
    }
    out.push_str("\nSections:\n");
    for section in &framework.sections {
        describe_section(&mut out, section, 1);
    }
    out
}

fn describe_section(out: &mut String, section: &FrameworkSection, depth: usize) {
    let indent = "  ".repeat(depth);
    out.push_str(&format!("{}- {} [{}]\n", indent, section.name, section.id));
    for question in &section.questions {
        out.push_str(&format!("{}    ? {}\n", indent, question));
    }
    for child in &section.children {
        describe_section(out, child, depth + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_swot() {
        let swot = Catalog::builtin().get("swot").unwrap();
        let text = describe(swot);
        assert!(text.starts_with("SWOT Analysis (swot)\n"));
        assert!(text.contains("Diagram: SWOT"));
        assert!(text.contains("  - Strengths [strengths]\n"));
    }
}
