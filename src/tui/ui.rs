//! UI rendering for the debugger.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, List, ListItem},
    style::{Color, Style, Modifier},
};
use crate::CpuState;
use crate::cpu::memory::MEMORY_SIZE;
use crate::cpu::registers::SP;
use super::app::{DebuggerApp, MEMORY_ROW};

/// Main draw function.
pub fn draw(frame: &mut Frame, app: &DebuggerApp) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(55),
            Constraint::Percentage(45),
        ])
        .split(frame.area());

    // Left side: code, registers and status
    let left_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(10),
            Constraint::Length(7),
            Constraint::Length(3),
        ])
        .split(chunks[0]);

    draw_disassembly(frame, left_chunks[0], app);
    draw_registers(frame, left_chunks[1], app);
    draw_status(frame, left_chunks[2], app);

    // Right side: memory, output and help
    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(10),
            Constraint::Length(6),
            Constraint::Length(4),
        ])
        .split(chunks[1]);

    draw_memory(frame, right_chunks[0], app);
    draw_output(frame, right_chunks[1], app);
    draw_help(frame, right_chunks[2]);
}

/// Draw disassembly view around the PC.
fn draw_disassembly(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let disasm = app.get_disassembly((area.height as usize).saturating_sub(2));

    let items: Vec<ListItem> = disasm
        .iter()
        .map(|(addr, instr, is_current)| {
            let prefix = if *is_current { "▶ " } else { "  " };
            let bp = if app.breakpoints.contains(addr) { "●" } else { " " };
            let text = format!("{}{:02X}: {}", prefix, addr, instr);

            let style = if *is_current {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else if app.breakpoints.contains(addr) {
                Style::default().fg(Color::Red)
            } else {
                Style::default()
            };

            ListItem::new(format!("{} {}", bp, text)).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(" Disassembly ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)));

    frame.render_widget(list, area);
}

/// Draw the register file, PC and run state.
fn draw_registers(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let regs = app.cpu.regs.all();

    let state_style = match app.cpu.state {
        CpuState::Running => Style::default().fg(Color::Green),
        CpuState::Halted => Style::default().fg(Color::Yellow),
        CpuState::Faulted => Style::default().fg(Color::Red),
    };

    let content = vec![
        register_line(regs, 0..4),
        register_line(regs, 4..8),
        Line::from(vec![
            Span::raw("PC: "),
            Span::styled(format!("{:02X}", app.cpu.pc()), Style::default().fg(Color::Yellow)),
            Span::raw("   Cycles: "),
            Span::styled(format!("{}", app.cpu.cycles), Style::default().fg(Color::Cyan)),
            Span::raw("   State: "),
            Span::styled(format!("{:?}", app.cpu.state), state_style),
        ]),
        Line::from(Span::styled(app.cpu.trace_line(), Style::default().fg(Color::DarkGray))),
    ];

    let paragraph = Paragraph::new(content)
        .block(Block::default()
            .title(" Registers ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green)));

    frame.render_widget(paragraph, area);
}

/// One row of registers: `R0: 08 (  8)   R1: ...`.
fn register_line(regs: &[u8], range: std::ops::Range<usize>) -> Line<'static> {
    let spans: Vec<Span<'static>> = range
        .flat_map(|i| {
            let label = if i == SP { format!("R{}/SP ", i) } else { format!("R{}: ", i) };
            [
                Span::raw(label),
                Span::styled(
                    format!("{:02X} ({:>3})   ", regs[i], regs[i]),
                    Style::default().fg(Color::White),
                ),
            ]
        })
        .collect();
    Line::from(spans)
}

/// Draw memory hex view.
fn draw_memory(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let visible_rows = (area.height as usize).saturating_sub(2);
    let pc = app.cpu.pc();
    let sp = usize::from(app.cpu.regs.sp());

    let items: Vec<ListItem> = (app.mem_scroll..MEMORY_SIZE / MEMORY_ROW)
        .take(visible_rows)
        .map(|row| {
            let base = row * MEMORY_ROW;
            let mut spans = vec![Span::styled(format!("{:02X}: ", base), Style::default().fg(Color::DarkGray))];

            for (addr, value) in app.cpu.mem.dump(base, MEMORY_ROW) {
                let style = if addr == pc {
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
                } else if addr == sp {
                    Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD)
                } else if value != 0 {
                    Style::default().fg(Color::White)
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                spans.push(Span::styled(format!("{:02X} ", value), style));
            }

            ListItem::new(Line::from(spans))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(" Memory ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta)));

    frame.render_widget(list, area);
}

/// Draw values printed by the program, most recent last.
fn draw_output(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let visible = (area.height as usize).saturating_sub(2);
    let skip = app.output.len().saturating_sub(visible);
    let lines: Vec<Line> = app.output[skip..]
        .iter()
        .map(|value| Line::from(value.to_string()))
        .collect();

    let output = Paragraph::new(lines)
        .block(Block::default()
            .title(" Output ")
            .borders(Borders::ALL));

    frame.render_widget(output, area);
}

/// Draw status bar.
fn draw_status(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let status = Paragraph::new(app.status.clone())
        .style(Style::default().fg(Color::White))
        .block(Block::default()
            .title(" Status ")
            .borders(Borders::ALL));

    frame.render_widget(status, area);
}

/// Draw help panel.
fn draw_help(frame: &mut Frame, area: Rect) {
    let help = Paragraph::new(vec![
        Line::from("s: Step  r: Run  p: Pause  b: Breakpoint"),
        Line::from("x: Reset  ↑↓: Scroll memory  q: Quit"),
    ])
    .style(Style::default().fg(Color::DarkGray))
    .block(Block::default()
        .title(" Help ")
        .borders(Borders::ALL));

    frame.render_widget(help, area);
}
