// vm.rs - Lock-step NFA simulation (Pike VM).
//
// Execution advances a current thread list and a next thread list through
// the subject one position at a time. Every epsilon instruction is
// resolved at insertion time by `add_thread`, so a thread list only ever
// holds threads resting on a consuming instruction or on `Match`. A
// generation counter dedups insertions by instruction pointer; because
// insertion order encodes priority, the first thread to claim an
// instruction in a generation is the preferred one and later arrivals are
// dropped.
//
// Capture slots and counter registers ride along on each thread as
// reference-counted vectors, cloned lazily on first write, so the common
// case of many threads sharing one history costs a pointer copy.
//
// Lookarounds run a fresh `Engine` over the same program at the current
// position, forward or backward by kind; backreferences consume the
// captured span one character per step, paced by a counter register.

use std::rc::Rc;

use crate::classes::{chars_equal, is_word_char};
use crate::program::{Disp, Inst, Options, Program};

/// Capture slots: two per group, pattern-wide group 0 included.
pub(crate) type Caps = Rc<Vec<Option<usize>>>;
/// Counter registers for bounded repetition and backreference pacing.
pub(crate) type Counters = Rc<Vec<u32>>;

/// Outcome of a successful anchored run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchState {
    /// Position one past the last consumed character.
    pub end: usize,
    /// Capture slots recorded by the winning thread: two per group, the
    /// whole match in slots `0`/`1`, character-addressed.
    pub slots: Vec<Option<usize>>,
}

/// Run `prog` anchored at character position `at`. Returns the winning
/// thread's end position and capture slots, or `None` when no thread
/// reaches `Match`. Callers wanting "match anywhere" loop over start
/// positions; [`Regex`](crate::Regex) does exactly that.
pub fn run_at(prog: &Program, subject: &[char], at: usize) -> Option<MatchState> {
    let mut caps = vec![None; 2 * (prog.group_count() + 1)];
    caps[0] = Some(at);
    let counters = vec![0u32; prog.counter_count()];
    let mut engine = Engine::new(
        prog.insts(),
        subject,
        prog.options().contains(Options::CASE_INSENSITIVE),
        1,
    );
    let (end, caps, _) = engine.run(0, at, Rc::new(caps), Rc::new(counters))?;
    let mut slots = (*caps).clone();
    slots[1] = Some(end);
    Some(MatchState { end, slots })
}

struct Thread {
    ip: usize,
    caps: Caps,
    counters: Counters,
}

/// One simulation over one program, in one direction. Lookarounds nest by
/// constructing a fresh engine, so `seen`/`gen` state never leaks between
/// the outer run and a sub-run.
struct Engine<'a> {
    insts: &'a [Inst],
    subject: &'a [char],
    fold: bool,
    /// `1` scans forward, `-1` backward (lookbehind bodies).
    dir: isize,
    /// Last generation that visited each instruction.
    seen: Vec<u32>,
    gen: u32,
}

fn target(ip: usize, d: Disp) -> usize {
    (ip as isize + 1 + d) as usize
}

/// The captured span of `group`, when both of its slots are set.
fn span(caps: &[Option<usize>], group: usize) -> Option<(usize, usize)> {
    match (*caps.get(2 * group)?, *caps.get(2 * group + 1)?) {
        (Some(s), Some(e)) if s <= e => Some((s, e)),
        _ => None,
    }
}

impl<'a> Engine<'a> {
    fn new(insts: &'a [Inst], subject: &'a [char], fold: bool, dir: isize) -> Engine<'a> {
        Engine {
            insts,
            subject,
            fold,
            dir,
            seen: vec![0; insts.len()],
            gen: 0,
        }
    }

    /// The character a consuming instruction would read at position `sp`.
    /// Forward reads the character to the right, backward the one to the
    /// left.
    fn char_at(&self, sp: usize) -> Option<char> {
        if self.dir > 0 {
            self.subject.get(sp).copied()
        } else if sp > 0 {
            self.subject.get(sp - 1).copied()
        } else {
            None
        }
    }

    fn run(
        &mut self,
        entry: usize,
        at: usize,
        caps: Caps,
        counters: Counters,
    ) -> Option<(usize, Caps, Counters)> {
        let mut clist = Vec::new();
        let mut sp = at;
        self.gen += 1;
        self.add_thread(&mut clist, entry, sp, caps, counters);
        let mut best = None;
        let insts = self.insts;
        loop {
            self.gen += 1;
            let mut nlist = Vec::new();
            for th in &clist {
                match &insts[th.ip] {
                    Inst::Match => {
                        // Threads after this one carry lower priority and
                        // are cut; threads already queued for the next
                        // position descend from higher-priority paths and
                        // may still overwrite this result.
                        best = Some((sp, th.caps.clone(), th.counters.clone()));
                        break;
                    }
                    Inst::Char(m) => {
                        if self.char_at(sp).is_some_and(|c| chars_equal(*m, c, self.fold)) {
                            self.step(&mut nlist, th, sp);
                        }
                    }
                    Inst::Any => {
                        if self.char_at(sp).is_some() {
                            self.step(&mut nlist, th, sp);
                        }
                    }
                    Inst::Class(spec) => {
                        if self.char_at(sp).is_some_and(|c| spec.contains(c, self.fold)) {
                            self.step(&mut nlist, th, sp);
                        }
                    }
                    Inst::NegClass(spec) => {
                        if self.char_at(sp).is_some_and(|c| !spec.contains(c, self.fold)) {
                            self.step(&mut nlist, th, sp);
                        }
                    }
                    Inst::Backref { group, reg } => {
                        self.step_backref(&mut nlist, th, sp, *group, *reg);
                    }
                    // epsilon instructions never rest in a thread list
                    _ => {}
                }
            }
            if nlist.is_empty() {
                break;
            }
            clist = nlist;
            sp = (sp as isize + self.dir) as usize;
        }
        best
    }

    /// Advance a thread past the consuming instruction it rests on.
    fn step(&mut self, nlist: &mut Vec<Thread>, th: &Thread, sp: usize) {
        let next = (sp as isize + self.dir) as usize;
        self.add_thread(nlist, th.ip + 1, next, th.caps.clone(), th.counters.clone());
    }

    /// Compare one character of the referenced span. The thread stays on
    /// the same instruction; insertion-time closure retires it once the
    /// register reaches the span length.
    fn step_backref(
        &mut self,
        nlist: &mut Vec<Thread>,
        th: &Thread,
        sp: usize,
        group: usize,
        reg: usize,
    ) {
        let (c, (s, e)) = match (self.char_at(sp), span(&th.caps, group)) {
            (Some(c), Some(range)) => (c, range),
            _ => return,
        };
        let r = th.counters[reg] as usize;
        let want = if self.dir > 0 { s + r } else { e - 1 - r };
        if want >= e || !chars_equal(self.subject[want], c, self.fold) {
            return;
        }
        let mut counters = th.counters.clone();
        Rc::make_mut(&mut counters)[reg] += 1;
        let next = (sp as isize + self.dir) as usize;
        self.add_thread(nlist, th.ip, next, th.caps.clone(), counters);
    }

    /// Insert a thread at `ip`, chasing epsilon instructions until every
    /// reachable consuming/`Match` instruction is in `list`. Split pushes
    /// its second branch under its first, so the depth-first order of the
    /// explicit stack preserves branch priority.
    ///
    /// Dedup is keyed on the instruction pointer alone. One consequence:
    /// a counted repetition whose body matches empty cannot run further
    /// empty iterations within one closure, so a pattern like
    /// `(?:a?){2}` under-matches when reaching its minimum would need an
    /// empty iteration.
    fn add_thread(&mut self, list: &mut Vec<Thread>, ip: usize, sp: usize, caps: Caps, counters: Counters) {
        let mut stack = vec![(ip, caps, counters)];
        while let Some((ip, mut caps, mut counters)) = stack.pop() {
            if self.seen[ip] == self.gen {
                continue;
            }
            self.seen[ip] = self.gen;
            match &self.insts[ip] {
                Inst::Jump(d) => stack.push((target(ip, *d), caps, counters)),
                Inst::Split(a, b) => {
                    stack.push((target(ip, *b), caps.clone(), counters.clone()));
                    stack.push((target(ip, *a), caps, counters));
                }
                Inst::Save(slot) => {
                    Rc::make_mut(&mut caps)[*slot] = Some(sp);
                    stack.push((ip + 1, caps, counters));
                }
                Inst::BeginLine => {
                    if sp == 0 || self.subject[sp - 1] == '\n' {
                        stack.push((ip + 1, caps, counters));
                    }
                }
                Inst::EndLine => {
                    if sp == self.subject.len() || self.subject[sp] == '\n' {
                        stack.push((ip + 1, caps, counters));
                    }
                }
                Inst::BeginText => {
                    if sp == 0 {
                        stack.push((ip + 1, caps, counters));
                    }
                }
                Inst::EndText => {
                    if sp == self.subject.len() {
                        stack.push((ip + 1, caps, counters));
                    }
                }
                Inst::WordBoundary => {
                    if self.at_word_boundary(sp) {
                        stack.push((ip + 1, caps, counters));
                    }
                }
                Inst::NotWordBoundary => {
                    if !self.at_word_boundary(sp) {
                        stack.push((ip + 1, caps, counters));
                    }
                }
                Inst::ResetCounter(reg) => {
                    Rc::make_mut(&mut counters)[*reg] = 0;
                    stack.push((ip + 1, caps, counters));
                }
                Inst::Repeat { min, max, reg } => {
                    let count = counters[*reg].saturating_add(1);
                    Rc::make_mut(&mut counters)[*reg] = count;
                    let completed = count - 1;
                    let split_ip = ip + 1;
                    if let Inst::Split(a, b) = self.insts[split_ip] {
                        let (body, exit) = if a == 0 { (a, b) } else { (b, a) };
                        if completed < *min {
                            stack.push((target(split_ip, body), caps, counters));
                        } else if max.is_some_and(|m| completed >= m) {
                            stack.push((target(split_ip, exit), caps, counters));
                        } else {
                            stack.push((split_ip, caps, counters));
                        }
                    }
                }
                Inst::Backref { group, reg } => {
                    let len = span(&caps, *group).map_or(0, |(s, e)| e - s);
                    if len == 0 || counters[*reg] as usize >= len {
                        stack.push((ip + 1, caps, counters));
                    } else {
                        list.push(Thread { ip, caps, counters });
                    }
                }
                Inst::Lookahead { body, onto } => {
                    if let Some((sc, scnt)) = self.look(ip, *body, sp, &caps, &counters, 1) {
                        stack.push((target(ip, *onto), sc, scnt));
                    }
                }
                Inst::NegLookahead { body, onto } => {
                    if self.look(ip, *body, sp, &caps, &counters, 1).is_none() {
                        stack.push((target(ip, *onto), caps, counters));
                    }
                }
                Inst::Lookbehind { body, onto } => {
                    if let Some((sc, scnt)) = self.look(ip, *body, sp, &caps, &counters, -1) {
                        stack.push((target(ip, *onto), sc, scnt));
                    }
                }
                Inst::NegLookbehind { body, onto } => {
                    if self.look(ip, *body, sp, &caps, &counters, -1).is_none() {
                        stack.push((target(ip, *onto), caps, counters));
                    }
                }
                // consuming instructions and Match rest here
                _ => list.push(Thread { ip, caps, counters }),
            }
        }
    }

    /// Run a lookaround body in a sub-engine. A positive lookaround
    /// continues with the sub-run's capture and counter state, so groups
    /// inside the body remain visible outside it.
    fn look(
        &self,
        ip: usize,
        body: Disp,
        sp: usize,
        caps: &Caps,
        counters: &Counters,
        dir: isize,
    ) -> Option<(Caps, Counters)> {
        let mut sub = Engine::new(self.insts, self.subject, self.fold, dir);
        let (_, sc, scnt) = sub.run(target(ip, body), sp, caps.clone(), counters.clone())?;
        Some((sc, scnt))
    }

    fn at_word_boundary(&self, sp: usize) -> bool {
        let before = sp > 0 && is_word_char(self.subject[sp - 1]);
        let after = sp < self.subject.len() && is_word_char(self.subject[sp]);
        before != after
    }
}
