//! Board editing commands and the interactive board shell.

use crate::config::AppConfig;
use crate::parse::{parse_position, parse_size, split_line};
use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use kurbo::{Point, Size};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use stratboard_core::instantiate::{self, ClipboardItem, DropPayload};
use stratboard_core::nodes::{ImageFormat, StickyNoteData, lines_from_text};
use stratboard_core::{
    Anchor, BoardCommand, BoardSession, Catalog, Connection, Node, NodeData, NodeId, NodeSize,
    Persistence, Position, Storage,
};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Subcommand, Debug, Clone)]
pub enum BoardOp {
    /// Print the board's nodes and edges
    Show,
    /// Drop a framework onto the board
    AddFramework {
        framework: String,
        /// Screen point of the drop (defaults to the viewport centre)
        #[arg(long, value_parser = parse_position, allow_hyphen_values = true)]
        at: Option<Position>,
    },
    /// Add a sticky note
    AddNote {
        /// Note body (HTML)
        #[arg(long)]
        text: Option<String>,
        /// Palette name or hex colour
        #[arg(long)]
        color: Option<String>,
    },
    /// Paste an image file onto the board
    PasteImage { file: PathBuf },
    /// Connect two nodes
    Connect {
        source: String,
        target: String,
        /// Anchor on the source node
        #[arg(long)]
        from: Option<Anchor>,
        /// Anchor on the target node
        #[arg(long)]
        to: Option<Anchor>,
    },
    /// Remove an edge
    Disconnect { edge: String },
    /// Replace a framework section's lines (one per line of TEXT)
    SetSection {
        node: String,
        section: String,
        text: String,
    },
    /// Change a sticky note's text and/or colour
    EditNote {
        node: String,
        #[arg(long)]
        text: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },
    /// Move a node to X,Y in board coordinates
    Move {
        node: String,
        #[arg(value_parser = parse_position, allow_hyphen_values = true)]
        position: Position,
    },
    /// Resize a node to WxH
    Resize {
        node: String,
        #[arg(value_parser = parse_size)]
        size: NodeSize,
    },
    /// Bring a node to the front
    Front { node: String },
    /// Delete a node and its edges
    Remove { node: String },
    /// Remove everything from the board
    Clear {
        /// Confirm clearing the board
        #[arg(long)]
        yes: bool,
    },
    /// Undo the last change made in this session
    Undo,
    /// Redo the last undone change
    Redo,
}

/// Open a project's board and fit the camera to its contents.
pub async fn open<S: Storage>(
    persistence: Persistence<S>,
    project: &str,
    config: &AppConfig,
) -> Result<BoardSession<S>> {
    if persistence.project(project).await?.is_none() {
        bail!("no project with id '{}'", project);
    }
    let mut session = BoardSession::open(persistence, project)
        .await?
        .with_autosave_delay(config.autosave_delay());
    fit_view(&mut session, config.viewport());
    Ok(session)
}

fn fit_view<S: Storage>(session: &mut BoardSession<S>, viewport: Size) {
    if let Some(bounds) = session.store().document().bounds() {
        session
            .store_mut()
            .camera_mut()
            .fit_to_bounds(bounds, viewport, 50.0);
    }
}

fn require_node<'a, S: Storage>(session: &'a BoardSession<S>, id: &str) -> Result<&'a Node> {
    session
        .store()
        .node(&NodeId::from(id))
        .with_context(|| format!("no node with id '{}'", id))
}

fn describe_node(node: &Node) -> String {
    let size = node.size();
    let extra = match &node.data {
        NodeData::Framework(data) => format!(
            "  [{}/{} sections filled]",
            data.filled_sections(),
            data.framework.section_ids().len()
        ),
        NodeData::StickyNote(note) => format!("  {}", note.color),
        NodeData::Image(_) => String::new(),
    };
    format!(
        "{:<38} {:<14} {:<32} at ({:.0}, {:.0})  {:.0}x{:.0}{}",
        node.id,
        node.kind().type_name(),
        format!("\"{}\"", node.title()),
        node.position.x,
        node.position.y,
        size.width,
        size.height,
        extra
    )
}

fn show<S: Storage>(session: &BoardSession<S>) {
    let doc = session.store().document();
    println!(
        "Board {} ({} nodes, {} edges) - {}",
        session.project_id(),
        doc.nodes.len(),
        doc.edges.len(),
        session.status().label()
    );
    for node in &doc.nodes {
        println!("  {}", describe_node(node));
    }
    if !doc.edges.is_empty() {
        println!("Edges:");
        for edge in &doc.edges {
            let handle = |a: Option<Anchor>| a.map(|a| format!("({})", a.as_str())).unwrap_or_default();
            println!(
                "  {}  {}{} -> {}{}",
                edge.id,
                edge.source,
                handle(edge.source_handle),
                edge.target,
                handle(edge.target_handle)
            );
        }
    }
}

/// Apply one board operation to an open session.
pub async fn apply<S: Storage>(session: &mut BoardSession<S>, op: &BoardOp, viewport: Size) -> Result<()> {
    match op {
        BoardOp::Show => show(session),
        BoardOp::AddFramework { framework, at } => {
            let screen = at
                .map(Point::from)
                .unwrap_or_else(|| Point::new(viewport.width / 2.0, viewport.height / 2.0));
            let node = instantiate::drop_node(
                &DropPayload::framework(framework.as_str()),
                screen,
                session.store().camera(),
                Catalog::builtin(),
            )?;
            let id = session.store_mut().add_node(node)?;
            println!("Added {}", id);
        }
        BoardOp::AddNote { text, color } => {
            if let Some(color) = color {
                StickyNoteData::resolve_color(color)
                    .with_context(|| format!("unknown colour '{}'", color))?;
            }
            let node = instantiate::add_sticky_note(session.store().camera());
            let id = session.store_mut().add_node(node)?;
            let callbacks = require_node(session, id.as_str())?.callbacks().clone();
            if let Some(text) = text {
                callbacks.change_text(text);
            }
            if let Some(color) = color {
                callbacks.change_color(color);
            }
            println!("Added {}", id);
        }
        BoardOp::PasteImage { file } => {
            let bytes = std::fs::read(file).with_context(|| format!("reading {}", file.display()))?;
            let decoded = image::load_from_memory(&bytes)
                .with_context(|| format!("{} is not a supported image", file.display()))?;
            let ext = file.extension().and_then(|e| e.to_str()).unwrap_or("png");
            let mime = match ImageFormat::from_extension(ext) {
                Some(format) => format.mime_type().to_string(),
                None => format!("image/{}", ext.to_ascii_lowercase()),
            };
            let items = [ClipboardItem::new(mime, bytes)];
            let mut node = instantiate::paste_image(&items, session.store().camera(), viewport)
                .context("clipboard holds no image")?;
            node.size = Some(instantiate::fitted_image_size(decoded.width(), decoded.height()));
            if let NodeData::Image(image) = &mut node.data {
                image.alt = file.file_name().and_then(|n| n.to_str()).map(str::to_string);
            }

            let id = session.store_mut().add_node(node)?;
            println!("Added {}", id);
        }
        BoardOp::Connect {
            source,
            target,
            from,
            to,
        } => {
            let connection = Connection::new(source.as_str(), target.as_str()).with_handles(*from, *to);
            for id in [source, target] {
                require_node(session, id)?;
            }
            if session
                .store_mut()
                .dispatch(BoardCommand::Connect(connection.clone()))?
            {
                println!("Connected {}", connection.edge_id());
            } else {
                println!("Already connected");
            }
        }
        BoardOp::Disconnect { edge } => {
            if session.store().document().edge(edge).is_none() {
                bail!("no edge with id '{}'", edge);
            }
            session
                .store_mut()
                .dispatch(BoardCommand::RemoveEdge(edge.clone()))?;
        }
        BoardOp::SetSection {
            node,
            section,
            text,
        } => {
            let target = require_node(session, node)?;
            let NodeData::Framework(data) = &target.data else {
                bail!("node '{}' is not a framework", node);
            };
            if data.framework.section(section).is_none() {
                bail!(
                    "{} has no section '{}' (sections: {})",
                    data.framework.name,
                    section,
                    data.framework.section_ids().join(", ")
                );
            }
            target
                .callbacks()
                .update_content(section, lines_from_text(text));
        }
        BoardOp::EditNote { node, text, color } => {
            let target = require_node(session, node)?;
            if !matches!(target.data, NodeData::StickyNote(_)) {
                bail!("node '{}' is not a sticky note", node);
            }
            if let Some(color) = color {
                StickyNoteData::resolve_color(color)
                    .with_context(|| format!("unknown colour '{}'", color))?;
            }
            let callbacks = target.callbacks();
            if let Some(text) = text {
                callbacks.change_text(text);
            }
            if let Some(color) = color {
                callbacks.change_color(color);
            }
        }
        BoardOp::Move { node, position } => {
            require_node(session, node)?;
            session.store_mut().dispatch(BoardCommand::Move {
                node: node.as_str().into(),
                position: *position,
            })?;
        }
        BoardOp::Resize { node, size } => {
            require_node(session, node)?;
            let id = NodeId::from(node.as_str());
            session.store_mut().dispatch(BoardCommand::Resize {
                node: id.clone(),
                size: *size,
            })?;
            if let Some(node) = session.store().node(&id) {
                let size = node.size();
                println!("Resized to {:.0}x{:.0}", size.width, size.height);
            }
        }
        BoardOp::Front { node } => {
            require_node(session, node)?;
            session.store_mut().bring_to_front(&NodeId::from(node.as_str()));
        }
        BoardOp::Remove { node } => {
            require_node(session, node)?.callbacks().delete();
        }
        BoardOp::Clear { yes } => {
            if !yes {
                bail!("clearing removes every node and edge; pass --yes to confirm");
            }
            session.clear().await?;
            println!("Board cleared");
        }
        BoardOp::Undo => {
            if !session.store_mut().undo() {
                println!("Nothing to undo");
            }
        }
        BoardOp::Redo => {
            if !session.store_mut().redo() {
                println!("Nothing to redo");
            }
        }
    }
    Ok(())
}

/// Run one operation and save.
pub async fn run_once<S: Storage>(
    persistence: Persistence<S>,
    project: &str,
    op: &BoardOp,
    config: &AppConfig,
) -> Result<()> {
    let mut session = open(persistence, project, config).await?;
    apply(&mut session, op, config.viewport()).await?;
    session.close().await?;
    Ok(())
}

#[derive(Parser, Debug)]
#[command(no_binary_name = true, disable_version_flag = true)]
struct ShellLine {
    #[command(subcommand)]
    op: BoardOp,
}

enum Flow {
    Continue,
    Quit,
}

async fn handle_line<S: Storage>(session: &mut BoardSession<S>, line: &str, viewport: Size) -> Result<Flow> {
    let words = split_line(line)?;
    match words.first().map(String::as_str) {
        None => return Ok(Flow::Continue),
        Some("quit" | "exit") => return Ok(Flow::Quit),
        Some("save") => {
            if session.flush().await? {
                println!("Saved");
            }
            return Ok(Flow::Continue);
        }
        _ => {}
    }
    match ShellLine::try_parse_from(words) {
        Ok(parsed) => apply(session, &parsed.op, viewport).await?,
        Err(e) => print!("{}", e),
    }
    Ok(Flow::Continue)
}

/// Interactive editing of one board. Changes are auto-saved after a quiet
/// period and flushed on exit.
pub async fn shell<S: Storage>(
    persistence: Persistence<S>,
    project: &str,
    config: &AppConfig,
) -> Result<()> {
    let mut session = open(persistence, project, config).await?;
    let viewport = config.viewport();
    println!(
        "Editing {}. Type `help` for commands, `save` to save now, `quit` to leave.",
        project
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(Duration::from_millis(200));
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match handle_line(&mut session, &line, viewport).await {
                    Ok(Flow::Quit) => break,
                    Ok(Flow::Continue) => {}
                    Err(e) => eprintln!("error: {:#}", e),
                }
            }
            _ = ticker.tick() => {
                match session.tick(Instant::now()).await {
                    Ok(true) => log::info!("Saved {}", session.project_id()),
                    Ok(false) => {}
                    Err(e) => log::warn!("Auto-save failed: {}", e),
                }
            }
        }
    }

    session.close().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use stratboard_core::storage::MemoryStorage;
    use stratboard_core::StorageMode;

    fn config() -> AppConfig {
        AppConfig::default()
    }

    async fn project() -> (Persistence<MemoryStorage>, String) {
        let persistence = Persistence::new(Arc::new(MemoryStorage::new()), StorageMode::Guest);
        let project = persistence.create_project("Test").await.unwrap();
        (persistence, project.id)
    }

    async fn run(persistence: &Persistence<MemoryStorage>, project: &str, line: &str) -> Result<()> {
        let words = split_line(line).unwrap();
        let op = ShellLine::try_parse_from(words)?.op;
        run_once(persistence.clone(), project, &op, &config()).await
    }

    async fn saved(persistence: &Persistence<MemoryStorage>, project: &str) -> stratboard_core::BoardDocument {
        persistence.load_board(project).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_add_and_fill_framework() {
        let (p, id) = project().await;
        run(&p, &id, "add-framework swot --at 640,400").await.unwrap();
        let doc = saved(&p, &id).await;
        assert_eq!(doc.nodes.len(), 1);
        assert_eq!(doc.nodes[0].position, Position::new(640.0, 400.0));
        let node_id = doc.nodes[0].id.to_string();

        run(&p, &id, &format!("set-section {} strengths 'Brand\\nScale'", node_id))
            .await
            .unwrap();
        let doc = saved(&p, &id).await;
        match &doc.nodes[0].data {
            NodeData::Framework(data) => assert_eq!(data.lines("strengths"), ["Brand", "Scale"]),
            other => panic!("unexpected node data {:?}", other),
        }

        let err = run(&p, &id, &format!("set-section {} nope x", node_id)).await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn test_notes_and_edges() {
        let (p, id) = project().await;
        run(&p, &id, "add-note --text hello --color green").await.unwrap();
        run(&p, &id, "add-note").await.unwrap();
        let doc = saved(&p, &id).await;
        assert_eq!(doc.nodes.len(), 2);
        match &doc.nodes[0].data {
            NodeData::StickyNote(note) => {
                assert_eq!(note.text, "hello");
                assert_eq!(note.color, "#bbf7d0");
            }
            other => panic!("unexpected node data {:?}", other),
        }

        let a = doc.nodes[0].id.to_string();
        let b = doc.nodes[1].id.to_string();
        run(&p, &id, &format!("connect {} {} --from right --to left", a, b))
            .await
            .unwrap();
        assert_eq!(saved(&p, &id).await.edges.len(), 1);

        run(&p, &id, &format!("remove {}", b)).await.unwrap();
        let doc = saved(&p, &id).await;
        assert_eq!(doc.nodes.len(), 1);
        assert!(doc.edges.is_empty());
    }

    #[tokio::test]
    async fn test_move_resize_and_clear() {
        let (p, id) = project().await;
        run(&p, &id, "add-note").await.unwrap();
        let node = saved(&p, &id).await.nodes[0].id.to_string();

        run(&p, &id, &format!("move {} -20,35", node)).await.unwrap();
        run(&p, &id, &format!("resize {} 100x100", node)).await.unwrap();
        let doc = saved(&p, &id).await;
        assert_eq!(doc.nodes[0].position, Position::new(-20.0, 35.0));
        assert_eq!(doc.nodes[0].size(), NodeSize::new(256.0, 180.0));

        assert!(run(&p, &id, "clear").await.is_err());
        run(&p, &id, "clear --yes").await.unwrap();
        assert!(p.load_board(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unknown_project() {
        let (p, _) = project().await;
        assert!(run(&p, "missing", "show").await.is_err());
    }

    #[tokio::test]
    async fn test_shell_undo() {
        let (p, id) = project().await;
        let mut session = open(p.clone(), &id, &config()).await.unwrap();
        let viewport = config().viewport();
        handle_line(&mut session, "add-note", viewport).await.unwrap();
        handle_line(&mut session, "add-note", viewport).await.unwrap();
        handle_line(&mut session, "undo", viewport).await.unwrap();
        assert_eq!(session.store().document().len(), 1);
        assert!(matches!(
            handle_line(&mut session, "quit", viewport).await.unwrap(),
            Flow::Quit
        ));
        session.close().await.unwrap();
        assert_eq!(saved(&p, &id).await.len(), 1);
    }
}
